//! IP address range handling.
//!
//! This module parses CIDR literals into canonical network form and answers
//! the containment questions the reachability projection needs.

pub mod cidr;

pub use cidr::{Cidr, SENTINEL_CIDR};
