//! Network reachability module.
//!
//! This module holds the directed graph over security groups and CIDR blocks,
//! the parsing of security group rules, and the reconciliation step that folds
//! each group into the graph as it is visited.

pub mod graph;
pub mod reconcile;
pub mod rules;

pub use graph::{difference, Edge, EndpointVertex, Provenance, ReachabilityGraph};
pub use reconcile::{reconcile_security_group, ReconcileSummary};
pub use rules::{parse_rules, Direction, Rule};
