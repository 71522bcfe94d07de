//! # Membership Registry Module
//!
//! Tracks structural containment and association between resources while a
//! conversion runs. The topology emitter records into it as resources are
//! visited and reads it back to decide where nodes nest and which instances
//! share a security group or CIDR block.
//!
//! ## Relations
//!
//! - parent: node or interface to its container
//! - subnet / interface, security group / interface (both directions)
//! - interface to owning instance
//! - subnet to CIDR block
//! - security group / CIDR block / subnet to instances
//!
//! All relations are append-only ordered multimaps; state lives for one
//! conversion run only.

pub mod membership;

pub use membership::{MembershipIndex, Relation};
