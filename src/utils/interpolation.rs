//! Identifier normalization.
//!
//! Attribute values arrive already interpolated, but references the
//! interpolater could not resolve (typically forward references to resources
//! not yet visited) are left in their raw `${...}` form. This module turns
//! either form into the canonical `type.name` identifier, qualified by the
//! module path of the declaring resource.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::resource::VariableRef;

/// Canonical resource identifier, e.g. `aws_subnet.a` or `module.net.aws_subnet.a.1`
pub type ResourceId = String;

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{(.*)\}$").expect("Invalid interpolation regex"));

/// `type.name`, an optional index, optionally module-qualified
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(module\.[\w-]+(\.[\w-]+)*\.)?[\w-]+\.[\w-]+(\.\d+)?$").expect("Invalid reference regex")
});

/// Interpolation roots that never name a managed resource
const NON_RESOURCE_ROOTS: [&str; 5] = ["var.", "local.", "count.", "path.", "self."];

/// Check for `${...}` interpolation syntax
pub fn is_interpolated(raw: &str) -> bool {
    INTERPOLATION.is_match(raw.trim())
}

/// Remove the `${}` wrapper, if any
pub fn strip_interpolation(raw: &str) -> &str {
    let raw = raw.trim();
    match INTERPOLATION.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => raw,
    }
}

/// Prefix a name with the module path, e.g. `["root", "base", "sub"]` and
/// `foo` give `module.base.sub.foo`. Root-only paths and names that are
/// already module-qualified are returned as-is.
pub fn qualify(module_path: &[String], name: &str) -> ResourceId {
    if module_path.len() <= 1 || name.starts_with("module.") {
        return name.to_string();
    }
    format!("module.{}.{}", module_path[1..].join("."), name)
}

/// Resolve a raw reference to a canonical resource identifier.
///
/// Never fails: a reference that cannot be resolved is logged and returned in
/// its best-effort form so conversion can continue.
pub fn normalize(
    module_path: &[String],
    raw: &str,
    variables: &BTreeMap<String, VariableRef>,
) -> ResourceId {
    let interpolated = is_interpolated(raw);
    let resolved = resolve(raw, interpolated, variables);

    if interpolated && !looks_like_resource(&resolved) {
        log::warn!(
            "Could not resolve reference '{}', using '{}' as its identifier",
            raw,
            resolved
        );
    }

    qualify(module_path, &resolved)
}

/// The resource an interpolated `${...}` value refers to, if it names one.
/// Plain strings and non-resource roots such as `var.` yield `None`.
pub fn resource_reference(
    module_path: &[String],
    raw: &str,
    variables: &BTreeMap<String, VariableRef>,
) -> Option<ResourceId> {
    if !is_interpolated(raw) {
        return None;
    }
    let resolved = resolve(raw, true, variables);
    looks_like_resource(&resolved).then(|| qualify(module_path, &resolved))
}

fn resolve(raw: &str, interpolated: bool, variables: &BTreeMap<String, VariableRef>) -> String {
    let token = strip_interpolation(raw);
    match variables.get(token) {
        Some(var) if interpolated => var.target(),
        _ => token.strip_suffix(".id").unwrap_or(token).to_string(),
    }
}

fn looks_like_resource(token: &str) -> bool {
    REFERENCE.is_match(token) && !NON_RESOURCE_ROOTS.iter().any(|root| token.starts_with(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Vec<String> {
        vec!["root".to_string()]
    }

    fn nested() -> Vec<String> {
        vec!["root".to_string(), "base".to_string(), "sub".to_string()]
    }

    #[test]
    fn test_strip_interpolation() {
        assert!(is_interpolated("${aws_vpc.main.id}"));
        assert!(!is_interpolated("aws_vpc.main"));
        assert_eq!(strip_interpolation("${aws_vpc.main.id}"), "aws_vpc.main.id");
        assert_eq!(strip_interpolation("  sg-123 "), "sg-123");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(&root(), "aws_vpc.main"), "aws_vpc.main");
        assert_eq!(qualify(&[], "aws_vpc.main"), "aws_vpc.main");
        assert_eq!(qualify(&nested(), "aws_vpc.main"), "module.base.sub.aws_vpc.main");
        assert_eq!(qualify(&nested(), "module.other.aws_vpc.main"), "module.other.aws_vpc.main");
    }

    #[test]
    fn test_normalize_direct_reference() {
        let vars = BTreeMap::new();
        assert_eq!(normalize(&root(), "${aws_subnet.a.id}", &vars), "aws_subnet.a");
        assert_eq!(normalize(&root(), "${aws_subnet.a.1.id}", &vars), "aws_subnet.a.1");
        assert_eq!(normalize(&nested(), "${aws_subnet.a.id}", &vars), "module.base.sub.aws_subnet.a");
    }

    #[test]
    fn test_normalize_through_variable_table() {
        let mut vars = BTreeMap::new();
        vars.insert(
            "var.subnet".to_string(),
            VariableRef {
                resource_type: "aws_subnet".to_string(),
                name: "private".to_string(),
                index: None,
            },
        );
        vars.insert(
            "aws_security_group.web.id".to_string(),
            VariableRef {
                resource_type: "aws_security_group".to_string(),
                name: "web".to_string(),
                index: Some(2),
            },
        );

        assert_eq!(normalize(&root(), "${var.subnet}", &vars), "aws_subnet.private");
        assert_eq!(
            normalize(&nested(), "${aws_security_group.web.id}", &vars),
            "module.base.sub.aws_security_group.web.2"
        );
        // Only interpolated tokens go through the table
        assert_eq!(normalize(&root(), "var.subnet", &vars), "var.subnet");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let vars = BTreeMap::new();
        for path in [root(), nested()] {
            for raw in ["${aws_vpc.main.id}", "aws_vpc.main", "sg-0abc", "${var.unknown}"] {
                let once = normalize(&path, raw, &vars);
                let twice = normalize(&path, &once, &vars);
                assert_eq!(once, twice, "normalize not idempotent for {}", raw);
            }
        }
    }

    #[test]
    fn test_unresolvable_reference_is_best_effort() {
        let vars = BTreeMap::new();
        assert_eq!(normalize(&root(), "${var.vpc_id}", &vars), "var.vpc_id");
        assert_eq!(
            normalize(&root(), "${element(aws_subnet.a.*.id, 0)}", &vars),
            "element(aws_subnet.a.*.id, 0)"
        );
        assert!(!looks_like_resource("var.vpc_id"));
        assert!(looks_like_resource("module.base.aws_vpc.main"));
    }

    #[test]
    fn test_resource_reference() {
        let vars = BTreeMap::new();
        assert_eq!(
            resource_reference(&nested(), "${aws_subnet.a.id}", &vars).as_deref(),
            Some("module.base.sub.aws_subnet.a")
        );
        assert_eq!(resource_reference(&root(), "aws_subnet.a", &vars), None);
        assert_eq!(resource_reference(&root(), "${var.subnet}", &vars), None);
    }
}
