//! Canvas-side graph state and interaction tracking.
//!
//! Holds the element set, per-node positions for the active layout mode,
//! the pan/zoom transform and hover/selection state. In force mode the
//! positions are driven by a `force_graph` simulation; every other mode is
//! static until the user drags a node.

use std::collections::{HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::elements::ElementSet;
use super::health::NodeView;
use super::layout::{self, LayoutMode, Position};
use super::scale::{ScaleConfig, ScaledValues};
use super::style::{EdgeStyle, NodeStyle, edge_style, node_style};
use super::surface::{GraphSurface, SelectHandler};

/// Zoom range for wheel and fit.
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 2.5;
/// Fit never zooms beyond this range, even for tiny or huge graphs.
const FIT_ZOOM: (f64, f64) = (0.3, 2.0);
/// Screen padding kept around the graph when fitting.
const FIT_PADDING: f64 = 100.0;
/// Pointer travel (screen px) below which a press counts as a click.
const CLICK_TOLERANCE: f64 = 3.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, clamped to [`MIN_ZOOM`]..[`MAX_ZOOM`].
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

/// Smooth hover highlighting.
///
/// Each node carries an intensity in 0.0..=1.0 that eases towards 1.0 while
/// it is hovered or next to the hovered node, and back to 0.0 afterwards. A
/// short hold time keeps the highlight from flickering when the pointer
/// grazes a node.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub hovered: Option<usize>,
	target: HashSet<usize>,
	intensity: HashMap<usize, f64>,
	hold: HashMap<usize, f64>,
	max: f64,
}

/// Seconds a highlight is held before it may fade.
const MIN_HOLD_TIME: f64 = 0.12;

impl HighlightState {
	pub fn set_hover(&mut self, node: Option<usize>, edges: &[EdgeView]) {
		if self.hovered == node {
			return;
		}
		self.hovered = node;
		self.target.clear();

		let Some(idx) = node else {
			return;
		};
		self.target.insert(idx);
		for e in edges {
			if e.from == idx {
				self.target.insert(e.to);
			} else if e.to == idx {
				self.target.insert(e.from);
			}
		}
		for &n in &self.target {
			self.hold.insert(n, MIN_HOLD_TIME);
		}
	}

	/// Eases intensities towards their targets.
	pub fn tick(&mut self, dt: f64) {
		const FADE_IN_SPEED: f64 = 6.0;
		const FADE_OUT_SPEED: f64 = 4.0;

		let fade_in = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let fade_out = (-FADE_OUT_SPEED * dt).exp();

		for &idx in &self.target {
			let v = self.intensity.entry(idx).or_insert(0.0);
			*v += (1.0 - *v) * fade_in;
		}

		let target = &self.target;
		self.hold.retain(|idx, t| {
			if target.contains(idx) {
				return true;
			}
			*t -= dt;
			*t > 0.0
		});

		let hold = &self.hold;
		let mut max: f64 = 0.0;
		self.intensity.retain(|idx, v| {
			if !target.contains(idx) && !hold.contains_key(idx) {
				*v *= fade_out;
			}
			max = max.max(*v);
			*v > 0.005
		});
		self.max = max;
	}

	pub fn node_intensity(&self, idx: usize) -> f64 {
		self.intensity.get(&idx).copied().unwrap_or(0.0)
	}

	/// Geometric mean of the endpoint intensities.
	pub fn edge_intensity(&self, from: usize, to: usize) -> f64 {
		(self.node_intensity(from) * self.node_intensity(to)).sqrt()
	}

	pub fn max_intensity(&self) -> f64 {
		self.max
	}
}

/// An edge resolved to node indices, with its style.
#[derive(Clone, Debug)]
pub struct EdgeView {
	pub from: usize,
	pub to: usize,
	pub style: EdgeStyle,
}

/// Physics simulation backing the force layout. Node user data is the node's
/// index in the element set.
struct Simulation {
	graph: ForceGraph<usize, ()>,
	handles: Vec<DefaultNodeIdx>,
}

impl Simulation {
	fn new(positions: &[Option<Position>], edges: &[EdgeView]) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let handles = positions
			.iter()
			.enumerate()
			.map(|(i, p)| {
				let p = p.unwrap_or_default();
				graph.add_node(NodeData {
					x: p.x as f32,
					y: p.y as f32,
					mass: 10.0,
					is_anchor: false,
					user_data: i,
				})
			})
			.collect::<Vec<_>>();
		for e in edges {
			graph.add_edge(handles[e.from], handles[e.to], EdgeData::default());
		}
		Self { graph, handles }
	}

	fn pin(&mut self, idx: usize, p: Position) {
		let handle = self.handles[idx];
		self.graph.visit_nodes_mut(|node| {
			if node.index() == handle {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
				node.data.is_anchor = true;
			}
		});
	}
}

/// Graph state behind the canvas.
///
/// Created once when the component mounts and mutated by event handlers and
/// the animation loop.
pub struct GraphState {
	elements: ElementSet,
	mode: LayoutMode,
	positions: Vec<Option<Position>>,
	styles: Vec<NodeStyle>,
	edges: Vec<EdgeView>,
	simulation: Option<Simulation>,
	on_select: Option<SelectHandler>,
	pub selected: Option<usize>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: HighlightState,
	pub scale: ScaleConfig,
	pub width: f64,
	pub height: f64,
}

impl GraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			elements: ElementSet::default(),
			mode: LayoutMode::default(),
			positions: Vec::new(),
			styles: Vec::new(),
			edges: Vec::new(),
			simulation: None,
			on_select: None,
			selected: None,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: HighlightState::default(),
			scale: ScaleConfig::default(),
			width,
			height,
		}
	}

	pub fn elements(&self) -> &ElementSet {
		&self.elements
	}

	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	pub fn nodes(&self) -> &[NodeView] {
		self.elements.nodes()
	}

	pub fn edges(&self) -> &[EdgeView] {
		&self.edges
	}

	pub fn style(&self, idx: usize) -> &NodeStyle {
		&self.styles[idx]
	}

	/// Position of a node, `None` when the current layout hides it.
	pub fn position(&self, idx: usize) -> Option<Position> {
		self.positions.get(idx).copied().flatten()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost visible node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(&self.scale, self.transform.k);
		(0..self.positions.len()).rev().find(|&i| {
			self.position(i).is_some_and(|p| {
				let r = self.styles[i].size / 2.0 + scale.hit_slop;
				(p.x - gx).powi(2) + (p.y - gy).powi(2) < r * r
			})
		})
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		self.highlight.set_hover(node, &self.edges);
	}

	/// Advances the simulation (force mode) and the hover animation.
	pub fn tick(&mut self, dt: f32) {
		if let Some(sim) = &mut self.simulation {
			sim.graph.update(dt);
			let positions = &mut self.positions;
			sim.graph.visit_nodes(|node| {
				positions[node.data.user_data] =
					Some(Position::new(f64::from(node.x()), f64::from(node.y())));
			});
		}
		self.highlight.tick(f64::from(dt));
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Zooms by `factor` around a screen point.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = k;
	}

	/// Bounding box of the visible nodes, including their radii.
	fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
		(0..self.positions.len())
			.filter_map(|i| self.position(i).map(|p| (p, self.styles[i].size / 2.0)))
			.fold(None, |acc, (p, r)| {
				let (x0, y0, x1, y1) = acc.unwrap_or((f64::MAX, f64::MAX, f64::MIN, f64::MIN));
				Some((x0.min(p.x - r), y0.min(p.y - r), x1.max(p.x + r), y1.max(p.y + r)))
			})
	}

	/// Centers the visible nodes in the canvas with a padded fit.
	pub fn fit_to_view(&mut self) {
		let Some((x0, y0, x1, y1)) = self.bounds() else {
			return;
		};
		let (w, h) = ((x1 - x0).max(1.0), (y1 - y0).max(1.0));
		let avail_w = (self.width - 2.0 * FIT_PADDING).max(1.0);
		let avail_h = (self.height - 2.0 * FIT_PADDING).max(1.0);
		let k = (avail_w / w).min(avail_h / h).clamp(FIT_ZOOM.0, FIT_ZOOM.1);

		self.transform.k = k;
		self.transform.x = self.width / 2.0 - (x0 + x1) / 2.0 * k;
		self.transform.y = self.height / 2.0 - (y0 + y1) / 2.0 * k;
	}

	/// Starts a drag on a node or a pan of the background.
	pub fn press(&mut self, sx: f64, sy: f64) {
		match self.node_at_position(sx, sy) {
			Some(idx) => {
				self.drag = DragState {
					node: Some(idx),
					start_x: sx,
					start_y: sy,
					node_start: self.position(idx).unwrap_or_default(),
					moved: false,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
					moved: false,
				};
			}
		}
	}

	/// Updates hover, drag or pan for a pointer move.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.drag.node {
			let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
			self.drag.moved |= dx.hypot(dy) > CLICK_TOLERANCE;
			if !self.drag.moved {
				return;
			}
			let p = Position::new(
				self.drag.node_start.x + dx / self.transform.k,
				self.drag.node_start.y + dy / self.transform.k,
			);
			self.positions[idx] = Some(p);
			if let Some(sim) = &mut self.simulation {
				sim.pin(idx, p);
			}
		} else if self.pan.active {
			let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
			self.pan.moved |= dx.hypot(dy) > CLICK_TOLERANCE;
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		} else {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}
	}

	/// Ends a drag or pan. A press that did not move selects the node under
	/// it, or clears the selection on the background.
	pub fn release(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		if let Some(idx) = drag.node {
			if !drag.moved {
				self.select(Some(idx));
			}
		} else if pan.active && !pan.moved {
			self.select(None);
		}
	}

	/// Abandons any gesture without changing the selection.
	pub fn cancel_gesture(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	pub fn select(&mut self, idx: Option<usize>) {
		self.selected = idx;
		if let Some(handler) = &mut self.on_select {
			handler(idx.map(|i| &self.elements.nodes()[i]));
		}
	}
}

impl GraphSurface for GraphState {
	fn set_elements(&mut self, elements: ElementSet) {
		let previous = self
			.selected
			.and_then(|i| self.elements.nodes().get(i))
			.map(|v| v.id().to_string());

		self.styles = elements
			.nodes()
			.iter()
			.map(|v| node_style(&v.kind, v.health, v.public))
			.collect();
		self.edges = elements
			.edges()
			.iter()
			.filter_map(|e| {
				Some(EdgeView {
					from: elements.position_of(&e.from)?,
					to: elements.position_of(&e.to)?,
					style: edge_style(&e.kind()),
				})
			})
			.collect();
		self.elements = elements;
		self.highlight = HighlightState::default();
		self.drag = DragState::default();

		// keep the selection when the node survives a refresh
		let selected = previous.and_then(|id| self.elements.position_of(&id));
		if selected != self.selected {
			self.select(selected);
		}
		self.set_layout(self.mode);
	}

	fn set_layout(&mut self, mode: LayoutMode) {
		self.mode = mode;
		let placed = layout::layout(mode, &self.elements);
		self.positions = self
			.elements
			.nodes()
			.iter()
			.map(|v| placed.get(v.id()).copied())
			.collect();

		self.simulation = match mode {
			LayoutMode::Force => Some(Simulation::new(&self.positions, &self.edges)),
			_ => None,
		};

		if mode == LayoutMode::Force {
			self.transform = ViewTransform {
				x: self.width / 2.0 - layout::CANVAS_WIDTH / 2.0,
				y: self.height / 2.0 - layout::CANVAS_HEIGHT / 2.0,
				k: 1.0,
			};
		} else {
			self.fit_to_view();
		}
	}

	fn on_node_select(&mut self, handler: SelectHandler) {
		self.on_select = Some(handler);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use serde_json::json;

	use super::*;
	use crate::components::resource_graph::types::ResourceGraph;

	fn sample() -> ElementSet {
		let graph: ResourceGraph = serde_json::from_value(json!({
			"nodes": [
				{"id": "aws:vpc:v1", "type": "vpc"},
				{"id": "aws:subnet:s1", "type": "subnet", "metadata": {"vpc_id": "v1"}},
				{"id": "aws:ec2:e1", "type": "ec2", "metadata": {"subnet_id": "s1", "vpc_id": "v1"}},
				{"id": "aws:iam_role:r", "type": "iam_role"}
			]
		}))
		.unwrap();
		ElementSet::from_graph(&graph)
	}

	fn state(mode: LayoutMode) -> GraphState {
		let mut s = GraphState::new(1000.0, 800.0);
		s.set_layout(mode);
		s.set_elements(sample());
		s
	}

	fn screen_of(s: &GraphState, idx: usize) -> (f64, f64) {
		let p = s.position(idx).unwrap();
		(
			p.x * s.transform.k + s.transform.x,
			p.y * s.transform.k + s.transform.y,
		)
	}

	fn recorder(s: &mut GraphState) -> Rc<RefCell<Vec<Option<String>>>> {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		s.on_node_select(Box::new(move |v| {
			sink.borrow_mut().push(v.map(|v| v.id().to_string()));
		}));
		seen
	}

	#[test]
	fn edges_resolve_to_indices() {
		let s = state(LayoutMode::Grid);
		let pairs: Vec<_> = s.edges().iter().map(|e| (e.from, e.to)).collect();
		assert_eq!(pairs, vec![(0, 1), (1, 2)]);
	}

	#[test]
	fn layered_mode_hides_unclassified_nodes() {
		let s = state(LayoutMode::Layered);
		assert!(s.position(0).is_some());
		assert!(s.position(3).is_none());
		let (sx, sy) = (s.transform.x, s.transform.y);
		assert_eq!(s.node_at_position(sx, sy), None);
	}

	#[test]
	fn fit_keeps_the_graph_on_screen() {
		let s = state(LayoutMode::Grid);
		assert!(s.transform.k >= FIT_ZOOM.0 && s.transform.k <= FIT_ZOOM.1);
		for i in 0..s.nodes().len() {
			let (x, y) = screen_of(&s, i);
			assert!(x > 0.0 && x < s.width && y > 0.0 && y < s.height);
		}
	}

	#[test]
	fn click_selects_and_background_click_clears() {
		let mut s = state(LayoutMode::Circle);
		let seen = recorder(&mut s);

		let (x, y) = screen_of(&s, 2);
		s.press(x, y);
		s.release();
		assert_eq!(s.selected, Some(2));

		s.press(1.0, 1.0);
		s.release();
		assert_eq!(s.selected, None);
		assert_eq!(
			*seen.borrow(),
			vec![Some("aws:ec2:e1".to_string()), None]
		);
	}

	#[test]
	fn dragging_moves_without_selecting() {
		let mut s = state(LayoutMode::Grid);
		let seen = recorder(&mut s);
		let before = s.position(0).unwrap();
		let (x, y) = screen_of(&s, 0);

		s.press(x, y);
		s.pointer_move(x + 40.0, y);
		s.release();

		let after = s.position(0).unwrap();
		assert!((after.x - before.x - 40.0 / s.transform.k).abs() < 1e-9);
		assert_eq!(after.y, before.y);
		assert!(seen.borrow().is_empty());
	}

	#[test]
	fn dragged_nodes_stay_pinned_in_force_mode() {
		let mut s = state(LayoutMode::Force);
		let (x, y) = screen_of(&s, 1);
		s.press(x, y);
		s.pointer_move(x + 50.0, y + 50.0);
		s.release();
		let pinned = s.position(1).unwrap();
		for _ in 0..10 {
			s.tick(0.016);
		}
		let after = s.position(1).unwrap();
		assert!((after.x - pinned.x).abs() < 1e-3);
		assert!((after.y - pinned.y).abs() < 1e-3);
	}

	#[test]
	fn wheel_zoom_is_clamped_around_the_cursor() {
		let mut s = state(LayoutMode::Grid);
		for _ in 0..100 {
			s.zoom_at(300.0, 200.0, 1.1);
		}
		assert_eq!(s.transform.k, MAX_ZOOM);
		let (gx, gy) = s.screen_to_graph(300.0, 200.0);
		s.zoom_at(300.0, 200.0, 0.9);
		let (hx, hy) = s.screen_to_graph(300.0, 200.0);
		assert!((gx - hx).abs() < 1e-9 && (gy - hy).abs() < 1e-9);
		for _ in 0..100 {
			s.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(s.transform.k, MIN_ZOOM);
	}

	#[test]
	fn selection_survives_a_refresh() {
		let mut s = state(LayoutMode::Grid);
		s.select(Some(2));
		let seen = recorder(&mut s);
		s.set_elements(sample());
		assert_eq!(s.selected, Some(2));
		assert!(seen.borrow().is_empty());

		s.set_elements(ElementSet::default());
		assert_eq!(s.selected, None);
		assert_eq!(*seen.borrow(), vec![None]);
	}

	#[test]
	fn hover_highlights_neighbours() {
		let mut s = state(LayoutMode::Grid);
		s.set_hover(Some(1));
		for _ in 0..30 {
			s.tick(0.016);
		}
		assert!(s.highlight.node_intensity(0) > 0.9);
		assert!(s.highlight.node_intensity(2) > 0.9);
		assert_eq!(s.highlight.node_intensity(3), 0.0);

		s.set_hover(None);
		for _ in 0..200 {
			s.tick(0.016);
		}
		assert_eq!(s.highlight.max_intensity(), 0.0);
	}
}
