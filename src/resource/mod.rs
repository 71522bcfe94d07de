//! Resource model module.
//!
//! This module contains the manifest declaration types, the per-occurrence
//! view handed to hooks, and the visitor used to route occurrences by kind.

pub mod types;
pub mod visitor;

pub use types::{Manifest, ResourceDecl, ResourceInstance, ResourceKind, VariableRef};
pub use visitor::{dispatch, AttributeDiff, ResourceHook, ResourceVisitor};
