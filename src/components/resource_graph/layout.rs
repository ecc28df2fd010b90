//! Layout engines.
//!
//! Every mode is a pure function of the element set and the fixed canvas
//! size. Positions are recomputed on each mode switch; the force mode only
//! produces the seed positions that the physics simulation starts from.

use std::collections::HashMap;
use std::f64::consts::TAU;

use super::elements::ElementSet;
use super::health::NodeView;
use super::layers::{LAYERS, LayerDefinition, groups_by_vpc};
use super::types::ResourceKind;

/// Logical canvas width all layouts are computed against.
pub const CANVAS_WIDTH: f64 = 1200.0;
/// Logical canvas height; the layered bands end above it.
pub const CANVAS_HEIGHT: f64 = 800.0;
/// Padding around grid cells.
pub const LAYOUT_PADDING: f64 = 30.0;
/// Smallest centre-to-centre distance between neighbours in the grid,
/// circle and concentric layouts.
const MIN_NODE_SPACING: f64 = 110.0;
/// Upper bound for horizontal spacing in a layered row.
const MAX_ROW_SPACING: f64 = 150.0;
/// Horizontal margin kept free on each side of a layered row.
const ROW_MARGIN: f64 = 100.0;
/// Columns in the wrapped grid of ungrouped nodes.
const UNGROUPED_COLUMNS: usize = 6;
/// Radius of the circle the force simulation is seeded on.
const FORCE_SEED_RADIUS: f64 = 100.0;

/// Convert usize to f64 for layout math.
#[inline]
fn f(n: usize) -> f64 {
	n as f64
}

/// Node placement strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
	/// Physics simulation, animated by the canvas.
	#[default]
	Force,
	/// Rows and columns in element order.
	Grid,
	/// Evenly spaced on one circle.
	Circle,
	/// Rings by degree, busiest nodes in the middle.
	Concentric,
	/// Architectural layers from internet down to data.
	Layered,
}

impl LayoutMode {
	/// Every mode in selector order.
	pub const ALL: [LayoutMode; 5] = [
		LayoutMode::Force,
		LayoutMode::Grid,
		LayoutMode::Circle,
		LayoutMode::Concentric,
		LayoutMode::Layered,
	];

	/// Stable key used by the layout selector.
	pub fn key(self) -> &'static str {
		match self {
			Self::Force => "force",
			Self::Grid => "grid",
			Self::Circle => "circle",
			Self::Concentric => "concentric",
			Self::Layered => "layers",
		}
	}

	/// Selector caption.
	pub fn label(self) -> &'static str {
		match self {
			Self::Force => "Force",
			Self::Grid => "Grid",
			Self::Circle => "Circle",
			Self::Concentric => "Concentric",
			Self::Layered => "Layers",
		}
	}

	/// Inverse of [`Self::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.key() == key)
	}
}

/// A point in graph coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Node id to position. Nodes absent from the map are not drawn.
pub type Layout = HashMap<String, Position>;

/// Computes positions for every node the mode places.
pub fn layout(mode: LayoutMode, elements: &ElementSet) -> Layout {
	let nodes = elements.nodes();
	if nodes.is_empty() {
		return Layout::new();
	}
	match mode {
		LayoutMode::Force => force_seed(nodes),
		LayoutMode::Grid => grid(nodes),
		LayoutMode::Circle => circle(nodes),
		LayoutMode::Concentric => concentric(nodes, &elements.degrees()),
		LayoutMode::Layered => layered(elements),
	}
}

fn center() -> Position {
	Position::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0)
}

/// Evenly spaced points on a circle, starting at angle zero.
fn ring(count: usize, radius: f64) -> impl Iterator<Item = Position> {
	let c = center();
	(0..count).map(move |i| {
		let angle = TAU * f(i) / f(count);
		Position::new(c.x + radius * angle.cos(), c.y + radius * angle.sin())
	})
}

/// Radius at which `count` nodes on a ring keep [`MIN_NODE_SPACING`].
fn spacing_radius(count: usize) -> f64 {
	f(count) * MIN_NODE_SPACING / TAU
}

fn place<'a>(
	nodes: impl IntoIterator<Item = &'a NodeView>,
	positions: impl IntoIterator<Item = Position>,
) -> Layout {
	nodes
		.into_iter()
		.zip(positions)
		.map(|(n, p)| (n.id().to_string(), p))
		.collect()
}

fn force_seed(nodes: &[NodeView]) -> Layout {
	place(nodes, ring(nodes.len(), FORCE_SEED_RADIUS))
}

/// `ceil(sqrt(n))` columns of padded square cells.
fn grid(nodes: &[NodeView]) -> Layout {
	let cols = f(nodes.len()).sqrt().ceil() as usize;
	let cell = ((CANVAS_WIDTH - 2.0 * LAYOUT_PADDING) / f(cols)).max(MIN_NODE_SPACING);

	place(
		nodes,
		(0..nodes.len()).map(|i| {
			let (col, row) = (i % cols, i / cols);
			Position::new(
				LAYOUT_PADDING + (f(col) + 0.5) * cell,
				LAYOUT_PADDING + (f(row) + 0.5) * cell,
			)
		}),
	)
}

/// One ring around the canvas centre, grown until neighbours do not overlap.
fn circle(nodes: &[NodeView]) -> Layout {
	if nodes.len() == 1 {
		return place(nodes, [center()]);
	}
	let radius = (CANVAS_HEIGHT / 2.5).max(spacing_radius(nodes.len()));
	place(nodes, ring(nodes.len(), radius))
}

/// Rings by degree. Each ring spans two degree values; the busiest ring is
/// innermost and a lone node there sits at the centre.
fn concentric(nodes: &[NodeView], degrees: &[usize]) -> Layout {
	const LEVEL_WIDTH: usize = 2;

	let max_degree = degrees.iter().copied().max().unwrap_or(0);
	let mut rings: Vec<Vec<usize>> = Vec::new();
	let mut order: Vec<usize> = (0..nodes.len()).collect();
	order.sort_by_key(|&i| std::cmp::Reverse(degrees[i]));

	let mut current_level = None;
	for i in order {
		let level = (max_degree - degrees[i]) / LEVEL_WIDTH;
		if current_level != Some(level) {
			rings.push(Vec::new());
			current_level = Some(level);
		}
		if let Some(ring) = rings.last_mut() {
			ring.push(i);
		}
	}

	let mut layout = Layout::new();
	let mut previous: Option<f64> = None;
	for members in &rings {
		let radius = match previous {
			None if members.len() == 1 => 0.0,
			None => MIN_NODE_SPACING.max(spacing_radius(members.len())),
			Some(prev) => (prev + MIN_NODE_SPACING).max(spacing_radius(members.len())),
		};
		previous = Some(radius);
		layout.extend(place(
			members.iter().map(|&i| &nodes[i]),
			ring(members.len(), radius),
		));
	}
	layout
}

/// Horizontal spacing for a row of `n` nodes.
pub fn row_spacing(n: usize) -> f64 {
	let gaps = n.saturating_sub(1).max(1);
	MAX_ROW_SPACING.min((CANVAS_WIDTH - 2.0 * ROW_MARGIN) / f(gaps))
}

/// x of the `i`th slot of a centred row laid out for `n` slots.
pub fn row_x(i: usize, n: usize) -> f64 {
	let spacing = row_spacing(n);
	ROW_MARGIN + f(i) * spacing + (CANVAS_WIDTH - f(n) * spacing) / 2.0
}

/// VPC a node is grouped under: its own id when it is a VPC, otherwise the
/// VPC its metadata names, provided that VPC is in the snapshot.
fn vpc_group(view: &NodeView, elements: &ElementSet) -> Option<String> {
	if view.kind == ResourceKind::Vpc {
		return Some(view.id().to_string());
	}
	let reference = view.node.reference_id("vpc", view.node.vpc_id()?);
	elements
		.node(&reference)
		.filter(|vpc| vpc.kind == ResourceKind::Vpc)
		.map(|_| reference)
}

/// Rows of node ids for one layer, each row paired with the slot count its
/// x positions are computed for.
fn layer_rows<'a>(
	layer: &LayerDefinition,
	members: &[&'a NodeView],
	elements: &ElementSet,
) -> Vec<(Vec<&'a NodeView>, usize)> {
	if !groups_by_vpc(layer) {
		return vec![(members.to_vec(), members.len())];
	}

	let mut groups: Vec<(String, Vec<&NodeView>)> = Vec::new();
	let mut ungrouped = Vec::new();
	for &view in members {
		match vpc_group(view, elements) {
			Some(key) => match groups.iter_mut().find(|(k, _)| *k == key) {
				Some((_, group)) => group.push(view),
				None => groups.push((key, vec![view])),
			},
			None => ungrouped.push(view),
		}
	}

	let mut rows = Vec::new();
	let grouped: Vec<&NodeView> = groups.into_iter().flat_map(|(_, g)| g).collect();
	if !grouped.is_empty() {
		let n = grouped.len();
		rows.push((grouped, n));
	}
	let columns = ungrouped.len().min(UNGROUPED_COLUMNS);
	for chunk in ungrouped.chunks(UNGROUPED_COLUMNS) {
		rows.push((chunk.to_vec(), columns));
	}
	rows
}

/// Architectural layers, each confined to its band. Unclassified nodes are
/// left out.
fn layered(elements: &ElementSet) -> Layout {
	let mut layout = Layout::new();
	for layer in &LAYERS {
		let members: Vec<&NodeView> = elements
			.nodes()
			.iter()
			.filter(|v| v.layer == Some(layer))
			.collect();
		if members.is_empty() {
			continue;
		}

		let rows = layer_rows(layer, &members, elements);
		let row_count = f(rows.len());
		for (r, (row, slots)) in rows.iter().enumerate() {
			let y = layer.y + layer.height * f(r + 1) / (row_count + 1.0);
			for (i, view) in row.iter().enumerate() {
				layout.insert(view.id().to_string(), Position::new(row_x(i, *slots), y));
			}
		}
	}
	layout
}

/// Layers that hold at least one node, in band order.
pub fn occupied_layers(elements: &ElementSet) -> Vec<&'static LayerDefinition> {
	LAYERS
		.iter()
		.filter(|layer| elements.nodes().iter().any(|v| v.layer == Some(*layer)))
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::resource_graph::types::{ResourceGraph, ResourceNode};

	fn elements(value: serde_json::Value) -> ElementSet {
		let graph: ResourceGraph = serde_json::from_value(value).unwrap();
		ElementSet::from_graph(&graph)
	}

	fn nodes_of(types: &[&str]) -> ElementSet {
		let mut set = ElementSet::default();
		for (i, t) in types.iter().enumerate() {
			set.add_node(ResourceNode {
				id: format!("aws:{t}:{i}"),
				resource_type: t.to_string(),
				..Default::default()
			});
		}
		set
	}

	fn dist(a: Position, b: Position) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn mode_keys_round_trip() {
		for mode in LayoutMode::ALL {
			assert_eq!(LayoutMode::from_key(mode.key()), Some(mode));
		}
		assert_eq!(LayoutMode::from_key("cose"), None);
		assert_eq!(LayoutMode::default(), LayoutMode::Force);
	}

	#[test]
	fn empty_set_has_empty_layout() {
		for mode in LayoutMode::ALL {
			assert!(layout(mode, &ElementSet::default()).is_empty());
		}
	}

	#[test]
	fn grid_uses_ceil_sqrt_columns() {
		let set = nodes_of(&["ec2"; 10]);
		let pos = layout(LayoutMode::Grid, &set);
		assert_eq!(pos.len(), 10);

		let mut xs: Vec<i64> = pos.values().map(|p| p.x.round() as i64).collect();
		xs.sort();
		xs.dedup();
		assert_eq!(xs.len(), 4);

		let mut ys: Vec<i64> = pos.values().map(|p| p.y.round() as i64).collect();
		ys.sort();
		ys.dedup();
		assert_eq!(ys.len(), 3);
		assert!(pos.values().all(|p| p.x >= LAYOUT_PADDING && p.y >= LAYOUT_PADDING));
	}

	#[test]
	fn circle_is_equidistant_from_centre() {
		let set = nodes_of(&["s3"; 7]);
		let pos = layout(LayoutMode::Circle, &set);
		let radii: Vec<f64> = pos.values().map(|p| dist(*p, center())).collect();
		for r in &radii {
			assert!((r - radii[0]).abs() < 1e-6);
		}
	}

	#[test]
	fn large_circles_grow_to_keep_spacing() {
		let set = nodes_of(&["s3"; 60]);
		let pos = layout(LayoutMode::Circle, &set);
		let p0 = pos["aws:s3:0"];
		let p1 = pos["aws:s3:1"];
		assert!(dist(p0, p1) >= MIN_NODE_SPACING * 0.99);
	}

	#[test]
	fn concentric_puts_busiest_node_in_the_middle() {
		let set = elements(json!({
			"nodes": [
				{"id": "hub", "type": "vpc"},
				{"id": "a", "type": "subnet"},
				{"id": "b", "type": "subnet"},
				{"id": "c", "type": "subnet"},
				{"id": "d", "type": "subnet"}
			],
			"edges": [
				{"from": "hub", "to": "a", "type": "ownership"},
				{"from": "hub", "to": "b", "type": "ownership"},
				{"from": "hub", "to": "c", "type": "ownership"},
				{"from": "hub", "to": "d", "type": "ownership"}
			]
		}));
		let pos = layout(LayoutMode::Concentric, &set);
		assert_eq!(pos["hub"], center());
		for leaf in ["a", "b", "c", "d"] {
			assert!(dist(pos[leaf], center()) >= MIN_NODE_SPACING - 1e-6);
		}
	}

	#[test]
	fn concentric_rings_span_two_degree_values() {
		// degrees: hub 3, x 2, l1 l2 y 1
		let set = elements(json!({
			"nodes": [
				{"id": "hub", "type": "vpc"},
				{"id": "x", "type": "subnet"},
				{"id": "l1", "type": "ec2"},
				{"id": "l2", "type": "ec2"},
				{"id": "y", "type": "ec2"}
			],
			"edges": [
				{"from": "hub", "to": "x", "type": "ownership"},
				{"from": "hub", "to": "l1", "type": "ownership"},
				{"from": "hub", "to": "l2", "type": "ownership"},
				{"from": "x", "to": "y", "type": "ownership"}
			]
		}));
		let pos = layout(LayoutMode::Concentric, &set);
		let r = |id: &str| dist(pos[id], center());
		assert!((r("hub") - r("x")).abs() < 1e-6);
		assert!((r("l1") - r("y")).abs() < 1e-6);
		assert!(r("l1") > r("hub"));
	}

	#[test]
	fn row_spacing_is_capped_and_centred() {
		assert_eq!(row_spacing(1), 150.0);
		assert_eq!(row_spacing(3), 150.0);
		assert_eq!(row_spacing(21), 50.0);
		// a single node sits on the formula's centre line
		assert_eq!(row_x(0, 1), 100.0 + (1200.0 - 150.0) / 2.0);
		let span = row_x(4, 5) - row_x(0, 5);
		assert_eq!(span, 4.0 * 150.0);
	}

	#[test]
	fn layered_vpc_subnet_instance() {
		let set = elements(json!({
			"nodes": [
				{"id": "aws:vpc:v1", "type": "vpc", "provider": "aws"},
				{"id": "aws:subnet:s1", "type": "subnet", "provider": "aws",
				 "metadata": {"vpc_id": "v1"}},
				{"id": "aws:ec2:e1", "type": "ec2", "provider": "aws",
				 "metadata": {"subnet_id": "s1", "vpc_id": "v1"}}
			],
			"edges": []
		}));
		let pos = layout(LayoutMode::Layered, &set);
		let network = &LAYERS[2];
		let compute = &LAYERS[3];
		assert!(network.contains_y(pos["aws:vpc:v1"].y));
		assert!(network.contains_y(pos["aws:subnet:s1"].y));
		assert!(compute.contains_y(pos["aws:ec2:e1"].y));
		assert_eq!(occupied_layers(&set), vec![network, compute]);
	}

	#[test]
	fn layered_bands_never_mix_and_keep_their_order() {
		let types = [
			"rds", "ec2", "alb", "cloudfront", "internet", "s3", "lambda", "vpc", "route53",
		];
		let set = nodes_of(&types);
		let pos = layout(LayoutMode::Layered, &set);
		for view in set.nodes() {
			let layer = view.layer.unwrap();
			let p = pos[view.id()];
			for other in &LAYERS {
				assert_eq!(other.contains_y(p.y), other == layer, "{}", view.id());
			}
		}
		let y = |t: &str| {
			let i = types.iter().position(|x| *x == t).unwrap();
			pos[&format!("aws:{t}:{i}")].y
		};
		assert!(y("internet") < y("cloudfront"));
		assert!(y("cloudfront") < y("alb"));
		assert!(y("alb") < y("ec2"));
		assert!(y("ec2") < y("rds"));
	}

	#[test]
	fn layered_skips_unclassified_nodes() {
		let set = nodes_of(&["iam_role", "ec2", "redshift"]);
		let pos = layout(LayoutMode::Layered, &set);
		assert_eq!(pos.len(), 1);
		assert!(pos.contains_key("aws:ec2:1"));
		assert_eq!(occupied_layers(&set).len(), 1);
	}

	#[test]
	fn ungrouped_nodes_wrap_below_vpc_groups() {
		let mut value = json!({
			"nodes": [
				{"id": "aws:vpc:v1", "type": "vpc"},
				{"id": "aws:subnet:a", "type": "subnet", "metadata": {"vpc_id": "v1"}}
			]
		});
		let nodes = value["nodes"].as_array_mut().unwrap();
		for i in 0..8 {
			nodes.push(json!({"id": format!("aws:security_group:{i}"), "type": "security_group"}));
		}
		let set = elements(value);
		let pos = layout(LayoutMode::Layered, &set);

		let group_y = pos["aws:vpc:v1"].y;
		assert_eq!(pos["aws:subnet:a"].y, group_y);

		let first = pos["aws:security_group:0"];
		let seventh = pos["aws:security_group:6"];
		assert!(first.y > group_y);
		assert!(seventh.y > first.y);
		assert_eq!(first.x, seventh.x);
		for id in ["aws:vpc:v1", "aws:security_group:7"] {
			assert!(LAYERS[2].contains_y(pos[id].y));
		}
	}

	#[test]
	fn vpc_groups_keep_visitation_order() {
		let set = elements(json!({
			"nodes": [
				{"id": "aws:vpc:b", "type": "vpc"},
				{"id": "aws:vpc:a", "type": "vpc"},
				{"id": "aws:subnet:a1", "type": "subnet", "metadata": {"vpc_id": "a"}},
				{"id": "aws:subnet:b1", "type": "subnet", "metadata": {"vpc_id": "b"}}
			]
		}));
		let pos = layout(LayoutMode::Layered, &set);
		let x = |id: &str| pos[id].x;
		assert!(x("aws:vpc:b") < x("aws:subnet:b1"));
		assert!(x("aws:subnet:b1") < x("aws:vpc:a"));
		assert!(x("aws:vpc:a") < x("aws:subnet:a1"));
	}

	#[test]
	fn force_seed_places_every_node() {
		let set = nodes_of(&["ec2", "s3", "rds"]);
		let pos = layout(LayoutMode::Force, &set);
		assert_eq!(pos.len(), 3);
		for p in pos.values() {
			assert!((dist(*p, center()) - FORCE_SEED_RADIUS).abs() < 1e-6);
		}
	}
}
