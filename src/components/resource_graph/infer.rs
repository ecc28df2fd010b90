//! Relationship inference.
//!
//! The graph API only reports the edges the backend knows about. Containment
//! and traffic relationships implied by node metadata (a subnet's `vpc_id`,
//! an instance's `subnet_id`) are synthesized here so the rendered graph is
//! connected. Inferred edges augment the API edges and live only for the
//! current render.

use std::collections::HashSet;

use super::types::{EdgeKind, INTERNET_NODE_ID, ResourceEdge, ResourceKind, ResourceNode};

/// Synthesizes the edges implied by node metadata.
///
/// Rules are independent and cumulative:
///
/// - VPC -> subnet ownership when the subnet's `vpc_id` names a present VPC.
/// - Subnet -> compute ownership when the workload's `subnet_id` names a
///   present subnet.
/// - Load balancer -> compute network edges within the same `vpc_id`.
/// - Compute -> database dependency edges within the same `vpc_id`.
/// - NAT gateway -> [`INTERNET_NODE_ID`] network edges.
pub fn infer_edges(nodes: &[ResourceNode]) -> Vec<ResourceEdge> {
	let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let kinds: Vec<ResourceKind> = nodes.iter().map(ResourceNode::kind).collect();
	let mut edges = Vec::new();

	for (node, kind) in nodes.iter().zip(&kinds) {
		if *kind == ResourceKind::Subnet {
			if let Some(vpc) = node.vpc_id() {
				let vpc_node = node.reference_id("vpc", vpc);
				if present.contains(vpc_node.as_str()) {
					edges.push(ResourceEdge::new(vpc_node, &node.id, EdgeKind::Ownership));
				}
			}
		}

		if kind.is_compute() {
			if let Some(subnet) = node.subnet_id() {
				let subnet_node = node.reference_id("subnet", subnet);
				if present.contains(subnet_node.as_str()) {
					edges.push(ResourceEdge::new(
						subnet_node,
						&node.id,
						EdgeKind::Ownership,
					));
				}
			}
		}

		if kind.is_load_balancer() {
			edges.extend(same_vpc_edges(
				node,
				nodes,
				&kinds,
				ResourceKind::is_compute,
				EdgeKind::Network,
			));
		}

		if kind.is_compute() {
			edges.extend(same_vpc_edges(
				node,
				nodes,
				&kinds,
				ResourceKind::is_database,
				EdgeKind::Dependency,
			));
		}

		if *kind == ResourceKind::NatGateway {
			edges.push(ResourceEdge::new(
				&node.id,
				INTERNET_NODE_ID,
				EdgeKind::Network,
			));
		}
	}

	edges
}

/// Edges from `source` to every node of a matching kind that shares its VPC.
/// A source without a `vpc_id` yields nothing.
fn same_vpc_edges<'a>(
	source: &'a ResourceNode,
	nodes: &'a [ResourceNode],
	kinds: &'a [ResourceKind],
	is_target: fn(&ResourceKind) -> bool,
	kind: EdgeKind,
) -> impl Iterator<Item = ResourceEdge> + 'a {
	let vpc = source.vpc_id();
	nodes
		.iter()
		.zip(kinds)
		.filter(move |(target, target_kind)| {
			vpc.is_some() && is_target(target_kind) && target.vpc_id() == vpc
		})
		.map(move |(target, _)| ResourceEdge::new(&source.id, &target.id, kind.clone()))
}

/// Whether any node routes to the internet through a NAT gateway.
pub fn needs_internet_node(nodes: &[ResourceNode]) -> bool {
	nodes
		.iter()
		.any(|n| n.kind() == ResourceKind::NatGateway)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn node(id: &str, resource_type: &str, metadata: serde_json::Value) -> ResourceNode {
		ResourceNode {
			id: id.into(),
			resource_type: resource_type.into(),
			provider: "aws".into(),
			metadata: metadata.as_object().cloned().unwrap_or_default(),
			..Default::default()
		}
	}

	fn pairs(edges: &[ResourceEdge]) -> Vec<(&str, &str, EdgeKind)> {
		edges
			.iter()
			.map(|e| (e.from.as_str(), e.to.as_str(), e.kind()))
			.collect()
	}

	#[test]
	fn vpc_subnet_instance_chain() {
		let nodes = vec![
			node("aws:vpc:v1", "vpc", json!({})),
			node("aws:subnet:s1", "subnet", json!({"vpc_id": "v1"})),
			node("aws:ec2:e1", "ec2", json!({"subnet_id": "s1", "vpc_id": "v1"})),
		];

		let edges = infer_edges(&nodes);
		assert_eq!(
			pairs(&edges),
			vec![
				("aws:vpc:v1", "aws:subnet:s1", EdgeKind::Ownership),
				("aws:subnet:s1", "aws:ec2:e1", EdgeKind::Ownership),
			]
		);
	}

	#[test]
	fn missing_parents_produce_no_ownership_edges() {
		let nodes = vec![
			node("aws:subnet:s1", "subnet", json!({"vpc_id": "gone"})),
			node("aws:lambda:f", "lambda", json!({"subnet_id": "gone"})),
		];
		assert!(infer_edges(&nodes).is_empty());
	}

	#[test]
	fn load_balancers_connect_to_every_compute_node_in_their_vpc() {
		let mut nodes = vec![
			node("aws:alb:a", "alb", json!({"vpc_id": "v1"})),
			node("aws:nlb:b", "nlb", json!({"vpc_id": "v1"})),
			node("aws:elb:c", "elb", json!({"vpc_id": "v2"})),
		];
		for i in 0..3 {
			nodes.push(node(&format!("aws:ec2:{i}"), "ec2", json!({"vpc_id": "v1"})));
		}
		nodes.push(node("aws:ecs:svc", "ecs", json!({"vpc_id": "v1"})));
		nodes.push(node("aws:ec2:other", "ec2", json!({"vpc_id": "v3"})));

		let network = infer_edges(&nodes)
			.into_iter()
			.filter(|e| e.kind() == EdgeKind::Network)
			.count();
		assert_eq!(network, 2 * 4);
	}

	#[test]
	fn nodes_without_vpc_take_part_in_no_scoped_edges() {
		let nodes = vec![
			node("aws:alb:a", "alb", json!({})),
			node("aws:ec2:e", "ec2", json!({})),
			node("aws:rds:d", "rds", json!({})),
		];
		assert!(infer_edges(&nodes).is_empty());
	}

	#[test]
	fn compute_depends_on_databases_in_same_vpc() {
		let nodes = vec![
			node("aws:lambda:f", "lambda", json!({"vpc_id": "v1"})),
			node("aws:rds:db", "rds", json!({"vpc_id": "v1"})),
			node("aws:dynamodb:t", "dynamodb", json!({"vpc_id": "v1"})),
			node("aws:s3:b", "s3", json!({"vpc_id": "v1"})),
		];

		let edges = infer_edges(&nodes);
		assert_eq!(
			pairs(&edges),
			vec![
				("aws:lambda:f", "aws:rds:db", EdgeKind::Dependency),
				("aws:lambda:f", "aws:dynamodb:t", EdgeKind::Dependency),
			]
		);
	}

	#[test]
	fn nat_gateways_route_to_the_internet() {
		let nodes = vec![
			node("aws:nat_gateway:n1", "nat_gateway", json!({})),
			node("aws:nat_gateway:n2", "nat_gateway", json!({})),
		];
		assert!(needs_internet_node(&nodes));
		let edges = infer_edges(&nodes);
		assert_eq!(edges.len(), 2);
		assert!(edges.iter().all(|e| e.to == INTERNET_NODE_ID));
		assert!(!needs_internet_node(&nodes[..0]));
	}

	#[test]
	fn provider_prefix_follows_the_child_node() {
		let mut vpc = node("gcp:vpc:v1", "vpc", json!({}));
		vpc.provider = "gcp".into();
		let mut subnet = node("gcp:subnet:s1", "subnet", json!({"vpc_id": "v1"}));
		subnet.provider = "gcp".into();

		let edges = infer_edges(&[vpc, subnet]);
		assert_eq!(edges.len(), 1);
		assert_eq!(edges[0].from, "gcp:vpc:v1");
	}
}
