//! Network topology module.
//!
//! This module contains the output record types, the projection of the
//! reachability graph onto instance-to-instance edges, and the emitter that
//! handles each resource kind.

pub mod types;
pub mod connections;
pub mod emitter;

// Re-export key types and functions for easier access
pub use types::{Element, ElementBody, TopologyEdge, TopologyNode, TopologyOutput, TopologyRecord};
pub use connections::{connect_by_cidr, connect_by_sg};
pub use emitter::TopologyEmitter;
