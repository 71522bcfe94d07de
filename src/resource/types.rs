//! Resource declarations and per-occurrence views.
//!
//! A [`ResourceDecl`] is one entry of the resource manifest: an already
//! interpolated resource configuration plus the variable table it was
//! interpolated with. The driver expands each declaration into one
//! [`ResourceInstance`] per `count` index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{TopologyError, TopologyResult};
use crate::utils::interpolation::{self, ResourceId};

/// Structural role a resource type plays in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Top-level virtual network (VPC)
    Network,
    /// Subnet nested in a network
    Subnet,
    /// Compute instance
    Compute,
    /// Network interface attached to an instance
    Interface,
    /// Security group holding ingress/egress rules
    SecurityGroup,
    /// Resource placed in several subnets at once (load balancers)
    MultiContainer,
}

/// A resource reference recorded in a declaring resource's variable table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl VariableRef {
    /// The `type.name` identifier this variable points at
    pub fn target(&self) -> String {
        match self.index {
            Some(index) => format!("{}.{}.{}", self.resource_type, self.name, index),
            None => format!("{}.{}", self.resource_type, self.name),
        }
    }
}

fn default_module_path() -> Vec<String> {
    vec!["root".to_string()]
}

/// One declared resource, as supplied by the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Module chain, starting with `root`
    #[serde(default = "default_module_path")]
    pub module_path: Vec<String>,
    /// Expansion count; an integer or a numeric string. Absent means one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Interpolation token (without `${}`) -> referenced resource
    #[serde(default)]
    pub variables: BTreeMap<String, VariableRef>,
}

impl ResourceDecl {
    /// Module-qualified `type.name` without any expansion index
    pub fn base_id(&self) -> ResourceId {
        interpolation::qualify(
            &self.module_path,
            &format!("{}.{}", self.resource_type, self.name),
        )
    }

    /// Evaluate the expansion count
    pub fn count(&self) -> TopologyResult<usize> {
        let invalid = |value: &Value| TopologyError::InvalidCount {
            resource: self.base_id(),
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };

        match &self.count {
            None | Some(Value::Null) => Ok(1),
            Some(value @ Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid(value)),
            Some(value @ Value::String(s)) => s.trim().parse::<usize>().map_err(|_| invalid(value)),
            Some(value) => Err(invalid(value)),
        }
    }
}

/// The resource manifest: declarations in dependency order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
}

/// A single occurrence of a declared resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceInstance<'a> {
    pub decl: &'a ResourceDecl,
    /// Expansion index; only set when the declaration expands to several occurrences
    pub index: Option<usize>,
}

impl<'a> ResourceInstance<'a> {
    pub fn new(decl: &'a ResourceDecl, index: Option<usize>) -> Self {
        Self { decl, index }
    }

    pub fn resource_type(&self) -> &'a str {
        &self.decl.resource_type
    }

    /// Identifier of this occurrence, suffixed with its expansion index
    pub fn id(&self) -> ResourceId {
        match self.index {
            Some(index) => format!("{}.{}", self.decl.base_id(), index),
            None => self.decl.base_id(),
        }
    }

    /// Resolve a raw reference found in this resource's attributes
    pub fn normalize(&self, raw: &str) -> ResourceId {
        interpolation::normalize(&self.decl.module_path, raw, &self.decl.variables)
    }

    pub fn attribute(&self, key: &str) -> Option<&'a Value> {
        self.decl.attributes.get(key)
    }

    /// A string attribute; empty strings count as absent
    pub fn str_attr(&self, key: &str) -> Option<&'a str> {
        self.attribute(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// A list-of-strings attribute. A bare string is treated as a one-element list.
    pub fn string_list(&self, key: &str) -> TopologyResult<Vec<&'a str>> {
        match self.attribute(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.as_str()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().ok_or_else(|| self.invalid(key, "a list of strings")))
                .collect(),
            Some(_) => Err(self.invalid(key, "a list of strings")),
        }
    }

    /// A nested block attribute such as `ingress` or `network_interface`.
    /// A single map is accepted in place of a one-element list.
    pub fn blocks(&self, key: &str) -> TopologyResult<Vec<&'a Map<String, Value>>> {
        match self.attribute(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(block)) => Ok(vec![block]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_object().ok_or_else(|| self.invalid(key, "a list of blocks")))
                .collect(),
            Some(_) => Err(self.invalid(key, "a list of blocks")),
        }
    }

    pub(crate) fn invalid(&self, attribute: &str, expected: &str) -> TopologyError {
        TopologyError::InvalidAttribute {
            resource: self.id(),
            attribute: attribute.to_string(),
            expected: expected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decl(value: Value) -> ResourceDecl {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decl_defaults() {
        let d = decl(json!({"type": "aws_vpc", "name": "main"}));
        assert_eq!(d.module_path, vec!["root".to_string()]);
        assert_eq!(d.count().unwrap(), 1);
        assert_eq!(d.base_id(), "aws_vpc.main");
        assert!(d.attributes.is_empty());
    }

    #[test]
    fn test_count_evaluation() {
        let mut d = decl(json!({"type": "aws_instance", "name": "web", "count": 3}));
        assert_eq!(d.count().unwrap(), 3);

        d.count = Some(json!("2"));
        assert_eq!(d.count().unwrap(), 2);

        d.count = Some(json!(0));
        assert_eq!(d.count().unwrap(), 0);

        d.count = Some(json!("${var.instances}"));
        let err = d.count().unwrap_err();
        assert_eq!(
            err,
            TopologyError::InvalidCount {
                resource: "aws_instance.web".to_string(),
                value: "${var.instances}".to_string(),
            }
        );

        d.count = Some(json!(-1));
        assert!(d.count().is_err());
    }

    #[test]
    fn test_module_qualified_ids() {
        let d = decl(json!({
            "type": "aws_subnet",
            "name": "private",
            "module_path": ["root", "network", "inner"],
        }));
        assert_eq!(d.base_id(), "module.network.inner.aws_subnet.private");

        let occurrence = ResourceInstance::new(&d, Some(1));
        assert_eq!(occurrence.id(), "module.network.inner.aws_subnet.private.1");
    }

    #[test]
    fn test_attribute_accessors() {
        let d = decl(json!({
            "type": "aws_instance",
            "name": "web",
            "attributes": {
                "subnet_id": "${aws_subnet.a.id}",
                "empty": "",
                "vpc_security_group_ids": ["${aws_security_group.web.id}", "sg-123"],
                "single_sg": "sg-456",
                "network_interface": {"device_index": 0, "network_interface_id": "eni"},
                "bad_list": [1, 2],
            }
        }));
        let res = ResourceInstance::new(&d, None);

        assert_eq!(res.str_attr("subnet_id"), Some("${aws_subnet.a.id}"));
        assert_eq!(res.str_attr("empty"), None);
        assert_eq!(res.str_attr("missing"), None);

        assert_eq!(
            res.string_list("vpc_security_group_ids").unwrap(),
            vec!["${aws_security_group.web.id}", "sg-123"]
        );
        assert_eq!(res.string_list("single_sg").unwrap(), vec!["sg-456"]);
        assert!(res.string_list("missing").unwrap().is_empty());
        assert!(matches!(
            res.string_list("bad_list"),
            Err(TopologyError::InvalidAttribute { .. })
        ));

        assert_eq!(res.blocks("network_interface").unwrap().len(), 1);
        assert!(res.blocks("subnet_id").is_err());
    }
}
