use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resource::ResourceKind;

/// Conversion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Resource type -> topology kind. Types not listed produce nothing.
    pub kinds: BTreeMap<String, ResourceKind>,
    /// Suppress repeated identical edges in the output
    pub dedupe_edges: bool,
    /// Upper bound on resource occurrences visited by one conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resources: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kinds.keys().any(|resource_type| resource_type.trim().is_empty()) {
            return Err(ValidationError::InvalidKinds(
                "resource type names cannot be empty".to_string(),
            ));
        }

        if self.max_resources == Some(0) {
            return Err(ValidationError::InvalidLimit(
                "max_resources must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Topology kind for a resource type
    pub fn kind_of(&self, resource_type: &str) -> Option<ResourceKind> {
        self.kinds.get(resource_type).copied()
    }
}

/// Default implementations
impl Default for Settings {
    fn default() -> Self {
        let kinds = [
            ("aws_vpc", ResourceKind::Network),
            ("aws_subnet", ResourceKind::Subnet),
            ("aws_instance", ResourceKind::Compute),
            ("aws_network_interface", ResourceKind::Interface),
            ("aws_security_group", ResourceKind::SecurityGroup),
            ("aws_elb", ResourceKind::MultiContainer),
            ("aws_lb", ResourceKind::MultiContainer),
            ("aws_alb", ResourceKind::MultiContainer),
        ]
        .into_iter()
        .map(|(resource_type, kind)| (resource_type.to_string(), kind))
        .collect();

        Self {
            kinds,
            dedupe_edges: true,
            max_resources: None,
            log_level: None,
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid kind mapping: {0}")]
    InvalidKinds(String),
    #[error("Invalid resource limit: {0}")]
    InvalidLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kinds() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.kind_of("aws_vpc"), Some(ResourceKind::Network));
        assert_eq!(settings.kind_of("aws_elb"), Some(ResourceKind::MultiContainer));
        assert_eq!(settings.kind_of("aws_s3_bucket"), None);
        assert!(settings.dedupe_edges);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
dedupe_edges: false
max_resources: 500
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(!settings.dedupe_edges);
        assert_eq!(settings.max_resources, Some(500));
        assert_eq!(settings.kind_of("aws_instance"), Some(ResourceKind::Compute));
    }

    #[test]
    fn test_custom_kinds_replace_defaults() {
        let yaml = r#"
kinds:
  google_compute_network: network
  google_compute_subnetwork: subnet
  google_compute_instance: compute
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.kind_of("google_compute_subnetwork"), Some(ResourceKind::Subnet));
        assert_eq!(settings.kind_of("aws_vpc"), None);
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.max_resources = Some(0);
        assert!(matches!(settings.validate(), Err(ValidationError::InvalidLimit(_))));

        let mut settings = Settings::default();
        settings.kinds.insert(" ".to_string(), ResourceKind::Compute);
        assert!(matches!(settings.validate(), Err(ValidationError::InvalidKinds(_))));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let yaml = r#"
kinds:
  aws_vpc: galaxy
"#;
        assert!(serde_yaml::from_str::<Settings>(yaml).is_err());
    }
}
