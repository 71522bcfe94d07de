//! Topology emitter.
//!
//! Receives every resource occurrence from the driver, routes it by kind, and
//! keeps the conversion state (membership index, reachability graph, output
//! list) that later occurrences read back.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::connections::{adopt_block_members, connect_by_cidr, connect_by_sg};
use super::types::{TopologyNode, TopologyOutput, TopologyRecord};
use crate::config::Settings;
use crate::error::TopologyResult;
use crate::ip::cidr::Cidr;
use crate::reachability::{parse_rules, reconcile_security_group, ReachabilityGraph};
use crate::registry::MembershipIndex;
use crate::resource::{dispatch, AttributeDiff, ResourceHook, ResourceInstance, ResourceVisitor};
use crate::utils::interpolation::{strip_interpolation, ResourceId};

/// Only the primary interface places an instance
const PRIMARY_DEVICE_INDEX: u64 = 0;

/// Conversion context threaded through every resource handler
#[derive(Debug)]
pub struct TopologyEmitter<'s> {
    settings: &'s Settings,
    index: MembershipIndex,
    graph: ReachabilityGraph,
    output: TopologyOutput,
}

impl<'s> TopologyEmitter<'s> {
    pub fn new(settings: &'s Settings) -> Self {
        Self {
            settings,
            index: MembershipIndex::new(),
            graph: ReachabilityGraph::new(),
            output: TopologyOutput::new(settings.dedupe_edges),
        }
    }

    pub fn index(&self) -> &MembershipIndex {
        &self.index
    }

    pub fn graph(&self) -> &ReachabilityGraph {
        &self.graph
    }

    pub fn output(&self) -> &TopologyOutput {
        &self.output
    }

    /// Finish the run and hand back the output list
    pub fn into_records(self) -> Vec<TopologyRecord> {
        self.output.into_records()
    }

    fn add_node(
        &mut self,
        id: &str,
        res: &ResourceInstance<'_>,
        parent: Option<&str>,
        attributes: BTreeMap<String, Value>,
    ) {
        if let Some(parent) = parent {
            self.index.record_parent(id, parent);
        }
        self.output.add_node(TopologyNode {
            id: id.to_string(),
            name: res.id(),
            kind: res.resource_type().to_string(),
            parent: parent.map(str::to_string),
            attributes,
        });
    }

    /// Wire a placed instance into the reachability projection: its groups
    /// first, then the CIDR blocks around its subnet
    fn attach_instance(&mut self, instance: &str, subnet: Option<&str>, groups: &[ResourceId]) {
        for group in groups {
            connect_by_sg(instance, group, &self.graph, &mut self.index, &mut self.output);
        }

        let Some(subnet) = subnet else {
            log::warn!("{} has no subnet, skipping CIDR reachability", instance);
            return;
        };

        let subnet_cidr = self.index.subnet_cidr(subnet).map(str::parse::<Cidr>);
        match subnet_cidr {
            Some(Ok(cidr)) => {
                connect_by_cidr(instance, &cidr, &self.graph, &mut self.index, &mut self.output);
            }
            Some(Err(e)) => log::warn!("{}: ignoring CIDR of subnet {}: {}", instance, subnet, e),
            None => log::warn!(
                "Couldn't match subnet {} of {} to a CIDR block, skipping CIDR reachability",
                subnet,
                instance
            ),
        }
        self.index.record_subnet_instance(subnet, instance);
    }

    fn normalized_list(&self, res: &ResourceInstance<'_>, key: &str) -> TopologyResult<Vec<ResourceId>> {
        Ok(res
            .string_list(key)?
            .into_iter()
            .map(|raw| res.normalize(raw))
            .collect())
    }
}

fn device_index(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ResourceVisitor for TopologyEmitter<'_> {
    fn visit_network(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        self.add_node(&res.id(), res, None, BTreeMap::new());
        Ok(())
    }

    fn visit_subnet(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        let id = res.id();
        let parent = res.str_attr("vpc_id").map(|raw| res.normalize(raw));

        let mut attributes = BTreeMap::new();
        if let Some(raw) = res.str_attr("cidr_block") {
            let cidr: Cidr = strip_interpolation(raw).parse()?;
            self.index.record_subnet_cidr(&id, &cidr.to_string());
            attributes.insert("CidrBlock".to_string(), json!(raw));
        }

        self.add_node(&id, res, parent.as_deref(), attributes);
        Ok(())
    }

    fn visit_compute(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        let id = res.id();
        let mut subnet: Option<ResourceId> = None;
        let mut groups: Vec<ResourceId> = Vec::new();

        if let Some(raw) = res.str_attr("subnet_id") {
            subnet = Some(res.normalize(raw));
            groups.extend(self.normalized_list(res, "vpc_security_group_ids")?);
            groups.extend(self.normalized_list(res, "security_groups")?);
        } else {
            let primary = res
                .blocks("network_interface")?
                .into_iter()
                .find(|ni| ni.get("device_index").and_then(device_index) == Some(PRIMARY_DEVICE_INDEX));

            if let Some(raw) = primary.and_then(|ni| ni.get("network_interface_id")).and_then(Value::as_str) {
                let interface = res.normalize(raw);
                subnet = self.index.parent_of(&interface).map(str::to_string);
                groups = self.index.interface_sgs(&interface).to_vec();
                self.index.record_interface_owner(&interface, &id);
            }
        }

        if subnet.is_none() {
            log::warn!("Couldn't determine the subnet of {}, emitting it without a parent", id);
        }
        self.add_node(&id, res, subnet.as_deref(), BTreeMap::new());
        self.attach_instance(&id, subnet.as_deref(), &groups);
        Ok(())
    }

    fn visit_interface(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        let id = res.id();
        let groups = self.normalized_list(res, "security_groups")?;

        if let Some(raw) = res.str_attr("subnet_id") {
            let subnet = res.normalize(raw);
            self.index.record_parent(&id, &subnet);
            self.index.record_subnet_interface(&subnet, &id);
        }
        for group in &groups {
            self.index.record_interface_sg(&id, group);
        }
        Ok(())
    }

    fn visit_security_group(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        let id = res.id();
        let rules = parse_rules(res)?;
        let summary = reconcile_security_group(&mut self.graph, &id, &rules);
        for block in &summary.new_blocks {
            adopt_block_members(block, &mut self.index);
        }
        Ok(())
    }

    /// Nodes nest under a single parent, so a resource spanning several
    /// subnets becomes one clone per subnet
    fn visit_multi_container(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<()> {
        let base = res.id();
        let subnets = self.normalized_list(res, "subnets")?;
        let groups = self.normalized_list(res, "security_groups")?;

        for (i, subnet) in subnets.iter().enumerate() {
            let clone_id = if i == 0 { base.clone() } else { format!("{}-{}", base, i) };
            self.add_node(&clone_id, res, Some(subnet), BTreeMap::new());
            self.attach_instance(&clone_id, Some(subnet), &groups);
        }
        Ok(())
    }
}

impl ResourceHook for TopologyEmitter<'_> {
    fn on_resource(&mut self, res: &ResourceInstance<'_>) -> TopologyResult<Option<AttributeDiff>> {
        let kind = self.settings.kind_of(res.resource_type());
        log::debug!("visiting {} ({:?})", res.id(), kind);
        dispatch(self, kind, res)?;
        Ok(None)
    }
}
