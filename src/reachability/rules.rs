//! Security group rule extraction.
//!
//! Rules are read in full before the reachability graph is touched, so a
//! malformed rule aborts the group without leaving half of it applied.

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{TopologyError, TopologyResult};
use crate::ip::cidr::Cidr;
use crate::resource::ResourceInstance;
use crate::utils::interpolation::{strip_interpolation, ResourceId};

/// Traffic direction of a rule, relative to the group declaring it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    /// Attribute holding the rule blocks for this direction
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// One ingress or egress rule of a security group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub direction: Direction,
    pub blocks: Vec<Cidr>,
    pub groups: Vec<ResourceId>,
}

impl Rule {
    pub fn names_sentinel(&self) -> bool {
        self.blocks.iter().any(Cidr::is_sentinel)
    }
}

/// Read every ingress and egress rule declared by a security group occurrence
pub fn parse_rules(res: &ResourceInstance<'_>) -> TopologyResult<Vec<Rule>> {
    let mut rules = Vec::new();
    for direction in [Direction::Ingress, Direction::Egress] {
        for block in res.blocks(direction.attribute())? {
            rules.push(parse_rule(res, direction, block)?);
        }
    }
    Ok(rules)
}

fn parse_rule(res: &ResourceInstance<'_>, direction: Direction, block: &Map<String, Value>) -> TopologyResult<Rule> {
    let cidr_literals = string_values(res, block, "cidr_blocks")?;
    let group_refs = string_values(res, block, "security_groups")?;
    let includes_self = block.get("self").and_then(Value::as_bool).unwrap_or(false);

    if cidr_literals.is_none() && group_refs.is_none() && !includes_self {
        return Err(TopologyError::MalformedRule {
            group: res.id(),
            direction: direction.to_string(),
        });
    }

    let blocks = cidr_literals
        .unwrap_or_default()
        .into_iter()
        .map(|literal| strip_interpolation(literal).parse::<Cidr>())
        .collect::<TopologyResult<Vec<_>>>()?;

    let mut groups: Vec<ResourceId> = group_refs
        .unwrap_or_default()
        .into_iter()
        .map(|raw| res.normalize(raw))
        .collect();
    if includes_self {
        groups.push(res.id());
    }

    Ok(Rule {
        direction,
        blocks,
        groups,
    })
}

/// A list-of-strings field inside a rule block; `None` when the field is absent
fn string_values<'a>(
    res: &ResourceInstance<'_>,
    block: &'a Map<String, Value>,
    key: &str,
) -> TopologyResult<Option<Vec<&'a str>>> {
    let expected = || res.invalid(key, "a list of strings");
    match block.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.as_str()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(expected))
            .collect::<TopologyResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(expected()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceDecl;
    use serde_json::json;

    fn group(attributes: Value) -> ResourceDecl {
        serde_json::from_value(json!({
            "type": "aws_security_group",
            "name": "web",
            "attributes": attributes,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_cidr_and_group_rules() {
        let decl = group(json!({
            "ingress": [
                {"from_port": 443, "cidr_blocks": ["10.0.0.7/16", "0.0.0.0/0"]},
                {"security_groups": ["${aws_security_group.lb.id}"]},
            ],
            "egress": {"cidr_blocks": "${10.1.0.0/24}"},
        }));
        let rules = parse_rules(&ResourceInstance::new(&decl, None)).unwrap();
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].direction, Direction::Ingress);
        let blocks: Vec<_> = rules[0].blocks.iter().map(ToString::to_string).collect();
        assert_eq!(blocks, vec!["10.0.0.0/16", "0.0.0.0/0"]);
        assert!(rules[0].names_sentinel());

        assert_eq!(rules[1].groups, vec!["aws_security_group.lb".to_string()]);
        assert!(!rules[1].names_sentinel());

        assert_eq!(rules[2].direction, Direction::Egress);
        assert_eq!(rules[2].blocks[0].to_string(), "10.1.0.0/24");
    }

    #[test]
    fn test_self_rule_names_own_group() {
        let decl = group(json!({"ingress": [{"self": true}]}));
        let rules = parse_rules(&ResourceInstance::new(&decl, Some(1))).unwrap();
        assert_eq!(rules[0].groups, vec!["aws_security_group.web.1".to_string()]);
    }

    #[test]
    fn test_rule_without_peers_is_rejected() {
        let decl = group(json!({"egress": [{"from_port": 0, "to_port": 0}]}));
        let err = parse_rules(&ResourceInstance::new(&decl, None)).unwrap_err();
        assert_eq!(
            err,
            TopologyError::MalformedRule {
                group: "aws_security_group.web".to_string(),
                direction: "egress".to_string(),
            }
        );
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_unparsable_cidr_is_rejected() {
        let decl = group(json!({"ingress": [{"cidr_blocks": ["${var.office_cidr}"]}]}));
        let err = parse_rules(&ResourceInstance::new(&decl, None)).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidCidr { .. }));
    }

    #[test]
    fn test_no_rules() {
        let decl = group(json!({"description": "empty"}));
        assert!(parse_rules(&ResourceInstance::new(&decl, None)).unwrap().is_empty());
    }
}
