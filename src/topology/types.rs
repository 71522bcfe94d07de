//! Topology output records.
//!
//! The output is an ordered list of graph elements in the format the
//! embedding visualization tool reads: every element is wrapped in a `data`
//! object, nodes carry `id`/`name`/`type`/`parent`/`node_data`, edges carry
//! `type: "edge"` with `source` and `target`. Empty fields are omitted.

use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::utils::interpolation::ResourceId;

/// A visual node: a container or an instance
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyNode {
    pub id: ResourceId,
    pub name: String,
    /// Resource type, e.g. `aws_subnet`
    pub kind: String,
    pub parent: Option<ResourceId>,
    pub attributes: BTreeMap<String, Value>,
}

/// "source is network-reachable to target"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopologyEdge {
    pub source: ResourceId,
    pub target: ResourceId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopologyRecord {
    Node(TopologyNode),
    Edge(TopologyEdge),
}

/// Wire body shared by nodes and edges
#[derive(serde::Serialize, Debug, Default, PartialEq)]
pub struct ElementBody {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_data: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
}

/// `{"data": {...}}`
#[derive(serde::Serialize, Debug, PartialEq)]
pub struct Element {
    pub data: ElementBody,
}

pub const EDGE_KIND: &str = "edge";

impl TopologyRecord {
    /// Convert into the wire element
    pub fn to_element(&self) -> Element {
        let data = match self {
            Self::Node(node) => ElementBody {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: node.kind.clone(),
                node_data: node.attributes.clone(),
                parent: node.parent.clone().unwrap_or_default(),
                ..ElementBody::default()
            },
            Self::Edge(edge) => ElementBody {
                kind: EDGE_KIND.to_string(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                ..ElementBody::default()
            },
        };
        Element { data }
    }
}

impl Serialize for TopologyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_element().serialize(serializer)
    }
}

/// Append-only output list shared by every resource handler
#[derive(Debug)]
pub struct TopologyOutput {
    records: Vec<TopologyRecord>,
    seen_edges: HashSet<TopologyEdge>,
    dedupe_edges: bool,
}

impl TopologyOutput {
    pub fn new(dedupe_edges: bool) -> Self {
        Self {
            records: Vec::new(),
            seen_edges: HashSet::new(),
            dedupe_edges,
        }
    }

    pub fn add_node(&mut self, node: TopologyNode) {
        log::debug!(
            "add node: {} parent={}",
            node.id,
            node.parent.as_deref().unwrap_or("")
        );
        self.records.push(TopologyRecord::Node(node));
    }

    /// Append an edge; self-loops are dropped, repeats too when deduplicating
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        if source == target {
            return false;
        }
        let edge = TopologyEdge {
            source: source.to_string(),
            target: target.to_string(),
        };
        if self.dedupe_edges && !self.seen_edges.insert(edge.clone()) {
            return false;
        }
        log::debug!("add edge: {} -> {}", source, target);
        self.records.push(TopologyRecord::Edge(edge));
        true
    }

    pub fn records(&self) -> &[TopologyRecord] {
        &self.records
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.records.iter().filter_map(|record| match record {
            TopologyRecord::Node(node) => Some(node),
            TopologyRecord::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &TopologyEdge> {
        self.records.iter().filter_map(|record| match record {
            TopologyRecord::Edge(edge) => Some(edge),
            TopologyRecord::Node(_) => None,
        })
    }

    pub fn into_records(self) -> Vec<TopologyRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_wire_format_omits_empty_fields() {
        let network = TopologyRecord::Node(TopologyNode {
            id: "aws_vpc.main".to_string(),
            name: "aws_vpc.main".to_string(),
            kind: "aws_vpc".to_string(),
            parent: None,
            attributes: BTreeMap::new(),
        });
        assert_eq!(
            serde_json::to_value(&network).unwrap(),
            json!({"data": {"id": "aws_vpc.main", "name": "aws_vpc.main", "type": "aws_vpc"}})
        );

        let mut attributes = BTreeMap::new();
        attributes.insert("CidrBlock".to_string(), json!("10.0.0.0/24"));
        let subnet = TopologyRecord::Node(TopologyNode {
            id: "aws_subnet.a".to_string(),
            name: "aws_subnet.a".to_string(),
            kind: "aws_subnet".to_string(),
            parent: Some("aws_vpc.main".to_string()),
            attributes,
        });
        assert_eq!(
            serde_json::to_value(&subnet).unwrap(),
            json!({"data": {
                "id": "aws_subnet.a",
                "name": "aws_subnet.a",
                "type": "aws_subnet",
                "parent": "aws_vpc.main",
                "node_data": {"CidrBlock": "10.0.0.0/24"},
            }})
        );
    }

    #[test]
    fn test_edge_wire_format() {
        let edge = TopologyRecord::Edge(TopologyEdge {
            source: "aws_instance.a".to_string(),
            target: "aws_instance.b".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            json!({"data": {"type": "edge", "source": "aws_instance.a", "target": "aws_instance.b"}})
        );
    }

    #[test]
    fn test_output_dedupes_edges() {
        let mut output = TopologyOutput::new(true);
        assert!(output.add_edge("a", "b"));
        assert!(!output.add_edge("a", "b"));
        assert!(output.add_edge("b", "a"));
        assert!(!output.add_edge("a", "a"));
        assert_eq!(output.edges().count(), 2);

        let mut output = TopologyOutput::new(false);
        output.add_edge("a", "b");
        output.add_edge("a", "b");
        assert_eq!(output.edges().count(), 2);
    }
}
