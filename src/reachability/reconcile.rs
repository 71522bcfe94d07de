//! Security group reconciliation.
//!
//! Groups are visited one at a time in whatever order the driver walks them,
//! and their rules may name groups that have not been visited yet. Each visit
//! first extends the wildcard (`0.0.0.0/0`) relation to the new group, then
//! checks the result against a shadow graph built from the group's own rules
//! and prunes whatever the rules do not confirm. Edges named directly by a
//! rule are never pruned, so the final edge set does not depend on the order
//! the groups arrive in.

use std::collections::BTreeSet;

use super::graph::{difference, Edge, EndpointVertex, Provenance, ReachabilityGraph};
use super::rules::{Direction, Rule};
use crate::ip::cidr::Cidr;

/// What a single reconciliation changed in the persistent graph
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// CIDR vertices the group's rules introduced
    pub new_blocks: Vec<Cidr>,
    /// Edges copied from the wildcard vertex onto the group
    pub backfilled: Vec<Edge>,
    /// Back-filled edges the group's rules did not confirm
    pub pruned: Vec<Edge>,
    /// Edges merged in from the shadow graph
    pub merged: usize,
}

/// Fold one security group and its rules into the persistent graph
pub fn reconcile_security_group(graph: &mut ReachabilityGraph, group: &str, rules: &[Rule]) -> ReconcileSummary {
    let this = EndpointVertex::group(group);
    let mut summary = ReconcileSummary::default();

    graph.ensure_vertex(this.clone());
    summary.backfilled = backfill(graph, &this);

    let shadow = build_shadow(graph, &this, rules, &mut summary.new_blocks);

    summary.pruned = prune(graph, &shadow, &this);

    for edge in shadow.edges() {
        let provenance = shadow.provenance(&edge).unwrap_or(Provenance::Derived);
        graph.connect(edge, provenance);
        summary.merged += 1;
    }

    log::debug!(
        "reconciled {}: {} back-filled, {} pruned, {} merged",
        group,
        summary.backfilled.len(),
        summary.pruned.len(),
        summary.merged
    );
    summary
}

/// Replicate edges touching the wildcard vertex onto `this`: whoever may send
/// anywhere may send to `this`, and `this` may send to whoever accepts from
/// anywhere.
fn backfill(graph: &mut ReachabilityGraph, this: &EndpointVertex) -> Vec<Edge> {
    let sentinel = EndpointVertex::sentinel();
    let senders: Vec<_> = graph.up_edges(&sentinel).iter().cloned().collect();
    let receivers: Vec<_> = graph.down_edges(&sentinel).iter().cloned().collect();

    let edges: Vec<Edge> = senders
        .into_iter()
        .map(|sender| Edge::new(sender, this.clone()))
        .chain(receivers.into_iter().map(|receiver| Edge::new(this.clone(), receiver)))
        .collect();

    for edge in &edges {
        log::debug!("back-fill: {}", edge);
        graph.connect(edge.clone(), Provenance::Derived);
    }
    edges
}

/// Build a disposable graph holding only what `this` group's rules imply.
/// CIDR vertices named by the rules are registered in the persistent graph.
fn build_shadow(
    graph: &mut ReachabilityGraph,
    this: &EndpointVertex,
    rules: &[Rule],
    new_blocks: &mut Vec<Cidr>,
) -> ReachabilityGraph {
    let mut shadow = ReachabilityGraph::new();
    let oriented = |peer: EndpointVertex, direction: Direction| match direction {
        Direction::Ingress => Edge::new(peer, this.clone()),
        Direction::Egress => Edge::new(this.clone(), peer),
    };

    for rule in rules {
        for cidr in &rule.blocks {
            let vertex = EndpointVertex::Block(*cidr);
            if graph.ensure_vertex(vertex.clone()) {
                new_blocks.push(*cidr);
            }
            shadow.connect(oriented(vertex, rule.direction), Provenance::Declared);
        }

        // The wildcard confirms every edge `this` already has in the rule's direction
        if rule.names_sentinel() {
            let confirmed: Vec<Edge> = graph
                .vertices()
                .map(|vertex| oriented(vertex.clone(), rule.direction))
                .filter(|edge| graph.has_edge(edge))
                .collect();
            for edge in confirmed {
                if !shadow.has_edge(&edge) {
                    shadow.connect(edge, Provenance::Derived);
                }
            }
        }

        for peer in &rule.groups {
            shadow.connect(oriented(EndpointVertex::group(peer.as_str()), rule.direction), Provenance::Declared);
        }
    }
    shadow
}

/// Remove edges of `this` that the shadow graph does not contain, unless some
/// rule declared them
fn prune(graph: &mut ReachabilityGraph, shadow: &ReachabilityGraph, this: &EndpointVertex) -> Vec<Edge> {
    let stale_sources = difference(graph.up_edges(this), shadow.up_edges(this));
    let stale_targets = difference(graph.down_edges(this), shadow.down_edges(this));

    let candidates = stale_sources
        .into_iter()
        .map(|source| Edge::new(source, this.clone()))
        .chain(stale_targets.into_iter().map(|target| Edge::new(this.clone(), target)))
        .collect::<BTreeSet<_>>();

    let mut pruned = Vec::new();
    for edge in candidates {
        if graph.is_declared(&edge) {
            continue;
        }
        log::debug!("pruning {}", edge);
        graph.remove_edge(&edge);
        pruned.push(edge);
    }
    pruned
}
