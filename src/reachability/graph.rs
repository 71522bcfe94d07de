//! Directed graph over security-group and CIDR endpoints.
//!
//! Edges point in the direction traffic is allowed to flow. Adjacency is kept
//! in both directions so up- and down-edges of a vertex are a single lookup.
//! Connecting two endpoints does not register them as vertices; only
//! [`ReachabilityGraph::ensure_vertex`] does, which is what scans over
//! "known" endpoints see.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ip::cidr::Cidr;
use crate::utils::interpolation::ResourceId;

/// A vertex: a security group or a canonical CIDR block
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointVertex {
    Group(ResourceId),
    Block(Cidr),
}

impl EndpointVertex {
    pub fn group(id: impl Into<ResourceId>) -> Self {
        Self::Group(id.into())
    }

    pub fn sentinel() -> Self {
        Self::Block(Cidr::sentinel())
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Block(cidr) if cidr.is_sentinel())
    }

    pub fn as_block(&self) -> Option<&Cidr> {
        match self {
            Self::Block(cidr) => Some(cidr),
            Self::Group(_) => None,
        }
    }
}

impl fmt::Display for EndpointVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "{}", id),
            Self::Block(cidr) => write!(f, "{}", cidr),
        }
    }
}

/// A directed edge, `source` may reach `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub source: EndpointVertex,
    pub target: EndpointVertex,
}

impl Edge {
    pub fn new(source: EndpointVertex, target: EndpointVertex) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Why an edge is in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Named directly by some group's rule
    Declared,
    /// Inferred through the wildcard block
    Derived,
}

#[derive(Debug, Default, Clone)]
pub struct ReachabilityGraph {
    vertices: BTreeSet<EndpointVertex>,
    /// source -> targets
    down: BTreeMap<EndpointVertex, BTreeSet<EndpointVertex>>,
    /// target -> sources
    up: BTreeMap<EndpointVertex, BTreeSet<EndpointVertex>>,
    declared: BTreeSet<Edge>,
}

static NO_NEIGHBORS: BTreeSet<EndpointVertex> = BTreeSet::new();

impl ReachabilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex; returns true if it was not present before
    pub fn ensure_vertex(&mut self, vertex: EndpointVertex) -> bool {
        self.vertices.insert(vertex)
    }

    pub fn has_vertex(&self, vertex: &EndpointVertex) -> bool {
        self.vertices.contains(vertex)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &EndpointVertex> {
        self.vertices.iter()
    }

    /// Registered CIDR vertices
    pub fn blocks(&self) -> impl Iterator<Item = &Cidr> {
        self.vertices.iter().filter_map(EndpointVertex::as_block)
    }

    /// Add an edge. Idempotent; a declared edge stays declared.
    pub fn connect(&mut self, edge: Edge, provenance: Provenance) -> bool {
        let added = self
            .down
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        self.up
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        if provenance == Provenance::Declared {
            self.declared.insert(edge);
        }
        added
    }

    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let removed = self
            .down
            .get_mut(&edge.source)
            .map_or(false, |targets| targets.remove(&edge.target));
        if let Some(sources) = self.up.get_mut(&edge.target) {
            sources.remove(&edge.source);
        }
        self.declared.remove(edge);
        removed
    }

    pub fn has_edge(&self, edge: &Edge) -> bool {
        self.down
            .get(&edge.source)
            .map_or(false, |targets| targets.contains(&edge.target))
    }

    pub fn is_declared(&self, edge: &Edge) -> bool {
        self.declared.contains(edge)
    }

    pub fn provenance(&self, edge: &Edge) -> Option<Provenance> {
        if !self.has_edge(edge) {
            None
        } else if self.is_declared(edge) {
            Some(Provenance::Declared)
        } else {
            Some(Provenance::Derived)
        }
    }

    /// Vertices with an edge into `vertex`
    pub fn up_edges(&self, vertex: &EndpointVertex) -> &BTreeSet<EndpointVertex> {
        self.up.get(vertex).unwrap_or(&NO_NEIGHBORS)
    }

    /// Vertices `vertex` has an edge into
    pub fn down_edges(&self, vertex: &EndpointVertex) -> &BTreeSet<EndpointVertex> {
        self.down.get(vertex).unwrap_or(&NO_NEIGHBORS)
    }

    /// All edges in source order
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.down.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| Edge::new(source.clone(), target.clone()))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.down.values().map(BTreeSet::len).sum()
    }
}

/// Elements of `a` that are not in `b`
pub fn difference(a: &BTreeSet<EndpointVertex>, b: &BTreeSet<EndpointVertex>) -> BTreeSet<EndpointVertex> {
    a.difference(b).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> EndpointVertex {
        EndpointVertex::group(format!("aws_security_group.{}", name))
    }

    fn block(cidr: &str) -> EndpointVertex {
        EndpointVertex::Block(cidr.parse().unwrap())
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut g = ReachabilityGraph::new();
        let e = Edge::new(group("a"), group("b"));
        assert!(g.connect(e.clone(), Provenance::Derived));
        assert!(!g.connect(e.clone(), Provenance::Derived));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.provenance(&e), Some(Provenance::Derived));

        g.connect(e.clone(), Provenance::Declared);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.provenance(&e), Some(Provenance::Declared));

        // Declared is sticky
        g.connect(e.clone(), Provenance::Derived);
        assert_eq!(g.provenance(&e), Some(Provenance::Declared));
    }

    #[test]
    fn test_connect_does_not_register_vertices() {
        let mut g = ReachabilityGraph::new();
        g.connect(Edge::new(group("a"), block("10.0.0.0/8")), Provenance::Declared);
        assert!(!g.has_vertex(&group("a")));
        assert_eq!(g.vertices().count(), 0);
        assert_eq!(g.down_edges(&group("a")).len(), 1);

        assert!(g.ensure_vertex(block("10.0.0.0/8")));
        assert!(!g.ensure_vertex(block("10.0.0.0/8")));
        assert_eq!(g.blocks().count(), 1);
    }

    #[test]
    fn test_up_and_down_edges() {
        let mut g = ReachabilityGraph::new();
        g.connect(Edge::new(group("a"), group("b")), Provenance::Declared);
        g.connect(Edge::new(group("c"), group("b")), Provenance::Declared);
        g.connect(Edge::new(group("b"), block("10.0.0.0/16")), Provenance::Declared);

        let up: Vec<_> = g.up_edges(&group("b")).iter().cloned().collect();
        assert_eq!(up, vec![group("a"), group("c")]);
        let down: Vec<_> = g.down_edges(&group("b")).iter().cloned().collect();
        assert_eq!(down, vec![block("10.0.0.0/16")]);
        assert!(g.up_edges(&group("zzz")).is_empty());
    }

    #[test]
    fn test_remove_edge() {
        let mut g = ReachabilityGraph::new();
        let e = Edge::new(group("a"), group("b"));
        g.connect(e.clone(), Provenance::Declared);
        assert!(g.remove_edge(&e));
        assert!(!g.has_edge(&e));
        assert!(g.up_edges(&group("b")).is_empty());
        assert!(g.down_edges(&group("a")).is_empty());
        assert_eq!(g.provenance(&e), None);
        assert!(!g.remove_edge(&e));
    }

    #[test]
    fn test_difference() {
        let a: BTreeSet<_> = [group("a"), group("b"), group("c")].into_iter().collect();
        let b: BTreeSet<_> = [group("b")].into_iter().collect();
        let d: Vec<_> = difference(&a, &b).into_iter().collect();
        assert_eq!(d, vec![group("a"), group("c")]);
    }

    #[test]
    fn test_sentinel_vertex() {
        assert!(EndpointVertex::sentinel().is_sentinel());
        assert_eq!(EndpointVertex::sentinel().to_string(), "0.0.0.0/0");
        assert!(!block("10.0.0.0/8").is_sentinel());
        assert!(!group("a").is_sentinel());
    }
}
