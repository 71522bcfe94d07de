//! Instance-to-instance edge projection.
//!
//! Projects the security group / CIDR reachability graph onto concrete
//! instances: an instance reaches another when a graph edge links endpoints
//! the two instances are members of. Members of a group are the instances
//! attached to it; members of a CIDR block are the instances whose whole
//! subnet lies inside it. The wildcard block stands for the outside world
//! and has no members.

use crate::ip::cidr::Cidr;
use crate::reachability::{EndpointVertex, ReachabilityGraph};
use crate::registry::MembershipIndex;
use crate::utils::interpolation::ResourceId;

use super::types::TopologyOutput;

/// Instances already recorded under an endpoint
fn members<'a>(index: &'a MembershipIndex, vertex: &EndpointVertex) -> Vec<&'a ResourceId> {
    match vertex {
        EndpointVertex::Group(group) => index.sg_instances(group).iter().collect(),
        EndpointVertex::Block(cidr) if cidr.is_sentinel() => Vec::new(),
        EndpointVertex::Block(cidr) => index.cidr_instances(&cidr.to_string()).iter().collect(),
    }
}

/// Draw edges between `instance` and the members of every endpoint adjacent
/// to `endpoint`
fn connect_neighbors(
    instance: &str,
    endpoint: &EndpointVertex,
    graph: &ReachabilityGraph,
    index: &MembershipIndex,
    output: &mut TopologyOutput,
) {
    for sender in graph.up_edges(endpoint) {
        for member in members(index, sender) {
            output.add_edge(member, instance);
        }
    }
    for receiver in graph.down_edges(endpoint) {
        for member in members(index, receiver) {
            output.add_edge(instance, member);
        }
    }
}

/// Connect an instance through one of its security groups, then record its
/// membership in that group
pub fn connect_by_sg(
    instance: &str,
    group: &str,
    graph: &ReachabilityGraph,
    index: &mut MembershipIndex,
    output: &mut TopologyOutput,
) {
    log::debug!("searching security group {} for {}", group, instance);
    connect_neighbors(instance, &EndpointVertex::group(group), graph, index, output);
    index.record_sg_instance(group, instance);
}

/// Connect an instance through every known CIDR block that fully contains
/// its subnet, then record it under each of those blocks
pub fn connect_by_cidr(
    instance: &str,
    subnet_cidr: &Cidr,
    graph: &ReachabilityGraph,
    index: &mut MembershipIndex,
    output: &mut TopologyOutput,
) {
    let containing: Vec<Cidr> = graph
        .blocks()
        .filter(|block| !block.is_sentinel() && block.contains(subnet_cidr))
        .copied()
        .collect();

    for block in containing {
        log::debug!("{} ({}) is inside {}", instance, subnet_cidr, block);
        connect_neighbors(instance, &EndpointVertex::Block(block), graph, index, output);
        index.record_cidr_instance(&block.to_string(), instance);
    }
}

/// Record already-visited instances under a CIDR block that has just become
/// known, so instances attached to groups afterwards can reach them
pub fn adopt_block_members(block: &Cidr, index: &mut MembershipIndex) {
    if block.is_sentinel() {
        return;
    }

    let inside: Vec<(String, Vec<ResourceId>)> = index
        .subnets_with_cidr()
        .filter(|(_, cidr)| cidr.parse::<Cidr>().map_or(false, |cidr| block.contains(&cidr)))
        .map(|(subnet, _)| (subnet.to_string(), index.subnet_instances(subnet).to_vec()))
        .collect();

    let key = block.to_string();
    for (subnet, instances) in inside {
        for instance in instances {
            log::debug!("{} ({}) is inside new block {}", instance, subnet, key);
            index.record_cidr_instance(&key, &instance);
        }
    }
}
