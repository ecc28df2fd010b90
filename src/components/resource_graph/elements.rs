//! The node and edge set handed to the drawing surface.

use std::collections::{HashMap, HashSet};

use super::health::NodeView;
use super::infer::{infer_edges, needs_internet_node};
use super::types::{INTERNET_NODE_ID, ResourceEdge, ResourceGraph, ResourceNode};

/// Nodes plus deduplicated edges, ready to render.
///
/// Edges are keyed by [`ResourceEdge::identity`], so merging the same edge
/// twice keeps one copy. Edges whose endpoints are not both present are
/// dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementSet {
	nodes: Vec<NodeView>,
	index: HashMap<String, usize>,
	edges: Vec<ResourceEdge>,
	edge_ids: HashSet<String>,
}

impl ElementSet {
	/// Builds the element set for a snapshot: API nodes, the synthetic
	/// internet node when needed, then API and inferred edges.
	pub fn from_graph(graph: &ResourceGraph) -> Self {
		let mut set = Self::default();
		for node in &graph.nodes {
			set.add_node(node.clone());
		}
		if needs_internet_node(&graph.nodes) && !set.contains(INTERNET_NODE_ID) {
			set.add_node(ResourceNode::internet());
		}
		set.merge_edges(graph.edges.iter().cloned());
		set.merge_edges(infer_edges(&graph.nodes));
		set
	}

	/// Adds a node. A node whose id is already present is ignored.
	pub fn add_node(&mut self, node: ResourceNode) -> bool {
		if self.index.contains_key(&node.id) {
			return false;
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(NodeView::new(node));
		true
	}

	/// Merges edges, returning how many were new.
	pub fn merge_edges(&mut self, edges: impl IntoIterator<Item = ResourceEdge>) -> usize {
		let mut added = 0;
		for edge in edges {
			if !self.contains(&edge.from) || !self.contains(&edge.to) {
				continue;
			}
			if self.edge_ids.insert(edge.identity()) {
				self.edges.push(edge);
				added += 1;
			}
		}
		added
	}

	/// Whether a node with this id is present.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&NodeView> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Position of a node in [`Self::nodes`].
	pub fn position_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[NodeView] {
		&self.nodes
	}

	/// Deduplicated edges whose endpoints both exist.
	pub fn edges(&self) -> &[ResourceEdge] {
		&self.edges
	}

	/// No nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of edges touching each node, in node order.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			if let Some(i) = self.position_of(&edge.from) {
				degrees[i] += 1;
			}
			if let Some(i) = self.position_of(&edge.to) {
				degrees[i] += 1;
			}
		}
		degrees
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::resource_graph::types::EdgeKind;

	fn graph(value: serde_json::Value) -> ResourceGraph {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn inferred_edges_are_deduplicated_on_merge() {
		let g = graph(json!({
			"nodes": [
				{"id": "aws:vpc:v1", "type": "vpc"},
				{"id": "aws:subnet:s1", "type": "subnet", "metadata": {"vpc_id": "v1"}}
			],
			"edges": []
		}));

		let mut set = ElementSet::from_graph(&g);
		assert_eq!(set.edges().len(), 1);
		assert_eq!(set.merge_edges(infer_edges(&g.nodes)), 0);
		assert_eq!(set.edges().len(), 1);
		assert_eq!(set.edges()[0].kind(), EdgeKind::Ownership);
	}

	#[test]
	fn api_edge_and_inferred_edge_with_same_identity_collapse() {
		let g = graph(json!({
			"nodes": [
				{"id": "aws:vpc:v1", "type": "vpc"},
				{"id": "aws:subnet:s1", "type": "subnet", "metadata": {"vpc_id": "v1"}}
			],
			"edges": [{"from": "aws:vpc:v1", "to": "aws:subnet:s1", "type": "ownership"}]
		}));
		assert_eq!(ElementSet::from_graph(&g).edges().len(), 1);
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let g = graph(json!({
			"nodes": [{"id": "a", "type": "ec2"}],
			"edges": [{"from": "a", "to": "missing", "type": "network"}]
		}));
		assert!(ElementSet::from_graph(&g).edges().is_empty());
	}

	#[test]
	fn internet_node_materializes_once_for_nat_gateways() {
		let g = graph(json!({
			"nodes": [
				{"id": "aws:nat_gateway:n1", "type": "nat_gateway"},
				{"id": "aws:nat_gateway:n2", "type": "nat_gateway"}
			]
		}));
		let set = ElementSet::from_graph(&g);
		assert_eq!(set.nodes().len(), 3);
		assert!(set.contains(INTERNET_NODE_ID));
		assert_eq!(set.edges().len(), 2);
		assert_eq!(set.degrees(), vec![1, 1, 2]);
	}

	#[test]
	fn duplicate_node_ids_keep_the_first() {
		let mut set = ElementSet::default();
		assert!(set.add_node(ResourceNode {
			id: "x".into(),
			resource_type: "vpc".into(),
			..Default::default()
		}));
		assert!(!set.add_node(ResourceNode {
			id: "x".into(),
			resource_type: "s3".into(),
			..Default::default()
		}));
		assert_eq!(set.node("x").map(|n| n.node.resource_type.as_str()), Some("vpc"));
	}
}
