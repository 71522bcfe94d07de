//! Resource visitation contract.
//!
//! The driver calls [`ResourceHook::on_resource`] once per resource
//! occurrence, strictly in sequence. Implementations route each occurrence
//! to one [`ResourceVisitor`] operation per resource kind via [`dispatch`].

use std::collections::BTreeMap;

use super::types::{ResourceInstance, ResourceKind};
use crate::error::TopologyResult;

/// Computed attributes a hook may hand back to the driver
pub type AttributeDiff = BTreeMap<String, String>;

/// Per-resource callback invoked by the driver
pub trait ResourceHook {
    fn on_resource(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<Option<AttributeDiff>>;
}

/// One operation per resource kind
pub trait ResourceVisitor {
    fn visit_network(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    fn visit_subnet(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    fn visit_compute(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    fn visit_interface(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    fn visit_security_group(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    fn visit_multi_container(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()>;

    /// Resource types with no topology role
    fn visit_other(&mut self, _res: &ResourceInstance<'_>) -> TopologyResult<()> {
        Ok(())
    }
}

/// Route an occurrence to the visitor operation for its kind
pub fn dispatch<V>(visitor: &mut V, kind: Option<ResourceKind>, res: &ResourceInstance<'_>) -> TopologyResult<()>
where
    V: ResourceVisitor + ?Sized,
{
    match kind {
        Some(ResourceKind::Network) => visitor.visit_network(res),
        Some(ResourceKind::Subnet) => visitor.visit_subnet(res),
        Some(ResourceKind::Compute) => visitor.visit_compute(res),
        Some(ResourceKind::Interface) => visitor.visit_interface(res),
        Some(ResourceKind::SecurityGroup) => visitor.visit_security_group(res),
        Some(ResourceKind::MultiContainer) => visitor.visit_multi_container(res),
        None => visitor.visit_other(res),
    }
}
