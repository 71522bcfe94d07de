//! Membership index.
//!
//! Append-only multimaps recording which resources contain or are associated
//! with which. Every relation keeps its values in insertion order and allows
//! duplicates; looking up an unknown key yields an empty slice.

use std::collections::HashMap;

use crate::utils::interpolation::ResourceId;

/// Ordered multimap from an identifier to the identifiers recorded under it
#[derive(Debug, Default, Clone)]
pub struct Relation {
    entries: HashMap<String, Vec<String>>,
    /// keys in first-recorded order
    order: Vec<String>,
}

impl Relation {
    pub fn record(&mut self, key: &str, value: &str) {
        match self.entries.get_mut(key) {
            Some(values) => values.push(value.to_string()),
            None => {
                self.order.push(key.to_string());
                self.entries.insert(key.to_string(), vec![value.to_string()]);
            }
        }
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value recorded for a key
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Structural containment and association between resources
#[derive(Debug, Default)]
pub struct MembershipIndex {
    /// node or interface -> parent container
    parent_of: Relation,
    /// subnet -> network interfaces
    subnet_interfaces: Relation,
    /// security group -> network interfaces
    sg_interfaces: Relation,
    /// network interface -> security groups
    interface_sgs: Relation,
    /// network interface -> owning instance
    interface_owner: Relation,
    /// subnet -> canonical CIDR block
    subnet_cidr: Relation,
    /// security group -> instances
    sg_instances: Relation,
    /// CIDR block -> instances whose subnet lies inside it
    cidr_instances: Relation,
    /// subnet -> instances
    subnet_instances: Relation,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parent(&mut self, child: &str, parent: &str) {
        log::debug!("membership: parent of {} = {}", child, parent);
        self.parent_of.record(child, parent);
    }

    pub fn parent_of(&self, child: &str) -> Option<&str> {
        self.parent_of.first(child)
    }

    pub fn record_subnet_interface(&mut self, subnet: &str, interface: &str) {
        self.subnet_interfaces.record(subnet, interface);
    }

    pub fn subnet_interfaces(&self, subnet: &str) -> &[ResourceId] {
        self.subnet_interfaces.get(subnet)
    }

    /// Record both directions of a security group / interface association
    pub fn record_interface_sg(&mut self, interface: &str, sg: &str) {
        log::debug!("membership: interface {} in security group {}", interface, sg);
        self.sg_interfaces.record(sg, interface);
        self.interface_sgs.record(interface, sg);
    }

    pub fn sg_interfaces(&self, sg: &str) -> &[ResourceId] {
        self.sg_interfaces.get(sg)
    }

    pub fn interface_sgs(&self, interface: &str) -> &[ResourceId] {
        self.interface_sgs.get(interface)
    }

    pub fn record_interface_owner(&mut self, interface: &str, instance: &str) {
        self.interface_owner.record(interface, instance);
    }

    pub fn interface_owner(&self, interface: &str) -> Option<&str> {
        self.interface_owner.first(interface)
    }

    pub fn record_subnet_cidr(&mut self, subnet: &str, cidr: &str) {
        self.subnet_cidr.record(subnet, cidr);
    }

    pub fn subnet_cidr(&self, subnet: &str) -> Option<&str> {
        self.subnet_cidr.first(subnet)
    }

    /// All subnets with a recorded CIDR block, in the order they were recorded
    pub fn subnets_with_cidr(&self) -> impl Iterator<Item = (&str, &str)> {
        self.subnet_cidr
            .keys()
            .filter_map(|subnet| self.subnet_cidr.first(subnet).map(|cidr| (subnet, cidr)))
    }

    pub fn record_sg_instance(&mut self, sg: &str, instance: &str) {
        log::debug!("membership: instance {} in security group {}", instance, sg);
        self.sg_instances.record(sg, instance);
    }

    pub fn sg_instances(&self, sg: &str) -> &[ResourceId] {
        self.sg_instances.get(sg)
    }

    pub fn record_cidr_instance(&mut self, cidr: &str, instance: &str) {
        log::debug!("membership: instance {} inside {}", instance, cidr);
        self.cidr_instances.record(cidr, instance);
    }

    pub fn cidr_instances(&self, cidr: &str) -> &[ResourceId] {
        self.cidr_instances.get(cidr)
    }

    pub fn record_subnet_instance(&mut self, subnet: &str, instance: &str) {
        self.subnet_instances.record(subnet, instance);
    }

    pub fn subnet_instances(&self, subnet: &str) -> &[ResourceId] {
        self.subnet_instances.get(subnet)
    }
}
