//! # Infraviz - Reachability topology builder for infrastructure-as-code
//!
//! This library converts a declarative cloud infrastructure plan into a
//! nested network diagram: networks contain subnets, subnets contain
//! instances, and directed edges say which instance can open connections
//! to which other instance.
//!
//! ## Overview
//!
//! Resources are visited one occurrence at a time, in dependency order. The
//! emitter keeps a membership index (what is inside what, which instance
//! belongs to which security group) and a reachability graph between
//! security groups and CIDR blocks. Every time an instance is placed, the
//! graph is projected onto the instances already seen, producing
//! instance-to-instance edges.
//!
//! ## Architecture
//!
//! - `config`: Conversion settings (resource type mapping, limits)
//! - `config_loader`: Settings and manifest file loading
//! - `error`: Per-resource configuration errors
//! - `ip`: CIDR block parsing and containment
//! - `resource`: Manifest declarations, resource occurrences and the visitor seam
//! - `utils`: Reference normalization and module qualification
//! - `registry`: Membership index
//! - `reachability`: Security group rules and the reachability graph
//! - `topology`: Output records, edge projection and the per-kind emitter
//! - `orchestrator`: Manifest traversal and JSON rendering
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use infraviz::{config::Settings, config_loader, orchestrator};
//!
//! let manifest = config_loader::load_manifest("plan.yaml".as_ref())?;
//! let records = orchestrator::convert(&manifest, &Settings::default())?;
//! println!("{}", orchestrator::render_json(&records)?);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Manifest Format
//!
//! ```yaml
//! resources:
//!   - type: aws_subnet
//!     name: a
//!     module_path: [root]
//!     attributes:
//!       vpc_id: "${aws_vpc.main.id}"
//!       cidr_block: "10.0.1.0/24"
//!     variables:
//!       aws_vpc.main.id:
//!         type: aws_vpc
//!         name: main
//! ```
//!
//! ## Error Handling
//!
//! Resource handlers return `TopologyError`; the orchestrator wraps those with
//! `color_eyre` context naming the failing resource and aborts the run.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod ip;
pub mod resource;
pub mod utils;
pub mod registry;
pub mod reachability;
pub mod topology;
pub mod orchestrator;
