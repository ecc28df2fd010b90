//! Canvas rendering for the resource graph.
//!
//! Drawing happens in passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Layer bands when the layered layout is active (world space)
//! 3. Edges with arrows
//! 4. Dimmed nodes, then highlighted and selected nodes on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::layers::LayerDefinition;
use super::layout::{self, LayoutMode, Position};
use super::scale::ScaledValues;
use super::state::{EdgeView, GraphState};
use super::style::{Background, Color, LineStyle, SELECTED, SELECTED_BORDER_WIDTH};

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<(f64, f64)>) {
	let pattern = match dash {
		Some((on, off)) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
		None => js_sys::Array::new(),
	};
	let _ = ctx.set_line_dash(&pattern);
}

/// Renders the complete graph to the canvas.
pub fn render(state: &GraphState, ctx: &CanvasRenderingContext2d, background: &Background) {
	let scale = ScaledValues::new(&state.scale, state.transform.k);

	draw_background(state, ctx, background);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	if state.mode() == LayoutMode::Layered {
		for layer in layout::occupied_layers(state.elements()) {
			draw_layer_band(ctx, layer, &scale);
		}
	}
	draw_edges(state, ctx, &scale);
	draw_nodes(state, ctx, &scale);

	ctx.restore();

	if background.vignette > 0.0 {
		draw_vignette(state, ctx, background);
	}
}

fn draw_background(state: &GraphState, ctx: &CanvasRenderingContext2d, bg: &Background) {
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	match ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, state.width.max(state.height) * 0.8) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &bg.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &bg.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&bg.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

fn draw_vignette(state: &GraphState, ctx: &CanvasRenderingContext2d, bg: &Background) {
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	let Ok(gradient) = ctx.create_radial_gradient(
		cx,
		cy,
		state.width.min(state.height) * 0.3,
		cx,
		cy,
		state.width.max(state.height) * 0.7,
	) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, "rgba(0, 0, 0, 0)");
	let _ = gradient.add_color_stop(1.0, &format!("rgba(0, 0, 0, {})", bg.vignette));
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

fn draw_layer_band(ctx: &CanvasRenderingContext2d, layer: &LayerDefinition, scale: &ScaledValues) {
	let color = Color::from_hex(layer.color).unwrap_or(Color::rgb(128, 128, 128));

	ctx.set_fill_style_str(&color.with_alpha(0.08).to_css());
	ctx.fill_rect(0.0, layer.y, layout::CANVAS_WIDTH, layer.height);

	ctx.set_stroke_style_str(&color.with_alpha(0.35).to_css());
	ctx.set_line_width(scale.edge_width(1.0));
	set_dash(ctx, LineStyle::Dashed.dash(2.0));
	ctx.stroke_rect(0.0, layer.y, layout::CANVAS_WIDTH, layer.height);
	set_dash(ctx, None);

	ctx.set_fill_style_str(&color.with_alpha(0.9).to_css());
	ctx.set_font(&format!("bold {}", scale.label_font));
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let _ = ctx.fill_text(layer.label, 8.0, layer.y + 6.0);
}

/// Dims everything outside the hover highlight.
fn dim_factor(state: &GraphState) -> f64 {
	let max_t = smooth_step(state.highlight.max_intensity());
	1.0 - 0.7 * max_t
}

fn draw_edges(state: &GraphState, ctx: &CanvasRenderingContext2d, scale: &ScaledValues) {
	let dim = dim_factor(state);
	for edge in state.edges() {
		let (Some(a), Some(b)) = (state.position(edge.from), state.position(edge.to)) else {
			continue;
		};
		let t = smooth_step(state.highlight.edge_intensity(edge.from, edge.to));
		let alpha = dim + (1.0 - dim) * t;
		draw_edge(state, ctx, scale, edge, a, b, alpha);
	}
	set_dash(ctx, None);
}

fn draw_edge(
	state: &GraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	edge: &EdgeView,
	a: Position,
	b: Position,
	alpha: f64,
) {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = dx.hypot(dy);
	let r_from = state.style(edge.from).size / 2.0;
	let r_to = state.style(edge.to).size / 2.0;
	if dist <= r_from + r_to {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let width = scale.edge_width(edge.style.width);
	let color = edge.style.color.with_alpha(0.85 * alpha);

	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(width);
	set_dash(ctx, edge.style.line.dash(width));

	let (tip_x, tip_y) = (b.x - ux * r_to, b.y - uy * r_to);
	ctx.begin_path();
	ctx.move_to(a.x + ux * r_from, a.y + uy * r_from);
	ctx.line_to(tip_x - ux * scale.arrow_size, tip_y - uy * scale.arrow_size);
	ctx.stroke();

	set_dash(ctx, None);
	ctx.set_fill_style_str(&color.to_css());
	let (back_x, back_y) = (tip_x - ux * scale.arrow_size, tip_y - uy * scale.arrow_size);
	let (px, py) = (-uy * scale.arrow_size * 0.5, ux * scale.arrow_size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_nodes(state: &GraphState, ctx: &CanvasRenderingContext2d, scale: &ScaledValues) {
	let dim = dim_factor(state);
	let count = state.nodes().len();
	let is_raised = |i: usize| state.highlight.node_intensity(i) > 0.001 || state.selected == Some(i);

	for i in (0..count).filter(|&i| !is_raised(i)) {
		draw_node(state, ctx, scale, i, dim, 1.0);
	}
	for i in (0..count).filter(|&i| is_raised(i)) {
		let t = smooth_step(state.highlight.node_intensity(i));
		let t = if state.selected == Some(i) { 1.0 } else { t };
		let grow = if state.highlight.hovered == Some(i) { 0.12 } else { 0.05 };
		draw_node(state, ctx, scale, i, dim + (1.0 - dim) * t, 1.0 + grow * t);
	}
}

fn draw_node(
	state: &GraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	idx: usize,
	alpha: f64,
	radius_mult: f64,
) {
	let Some(Position { x, y }) = state.position(idx) else {
		return;
	};
	let style = state.style(idx);
	let view = &state.nodes()[idx];
	let radius = style.size / 2.0 * radius_mult;

	ctx.set_global_alpha(alpha);

	if let Ok(gradient) =
		ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius)
	{
		let _ = gradient.add_color_stop(0.0, &style.fill.lighten(0.15).to_css());
		let _ = gradient.add_color_stop(1.0, &style.fill.to_css());
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
	} else {
		ctx.set_fill_style_str(&style.fill.to_css());
	}
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.fill();

	let (border_color, border_width) = if state.selected == Some(idx) {
		(SELECTED, SELECTED_BORDER_WIDTH)
	} else {
		(style.border_color, style.border_width)
	};
	ctx.set_stroke_style_str(&border_color.to_css());
	if style.border_style == LineStyle::Double && state.selected != Some(idx) {
		// two strokes splitting the border width with a gap between
		let stroke = border_width / 3.0;
		ctx.set_line_width(stroke);
		for offset in [stroke, border_width - stroke] {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius - border_width / 2.0 + offset, 0.0, 2.0 * PI);
			ctx.stroke();
		}
	} else {
		ctx.set_line_width(border_width);
		set_dash(ctx, style.border_style.dash(border_width));
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.stroke();
		set_dash(ctx, None);
	}

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&style.accent.lighten(0.3).to_css());
	ctx.set_font(&scale.icon_font(style.size * radius_mult));
	let _ = ctx.fill_text(style.icon, x, y);

	let label_alpha = alpha * scale.label_alpha;
	if label_alpha > 0.05 {
		ctx.set_global_alpha(label_alpha);
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.9)");
		ctx.set_font(&scale.label_font);
		ctx.set_text_baseline("top");
		let _ = ctx.fill_text(&view.label, x, y + radius + 4.0);
	}

	ctx.set_global_alpha(1.0);
}
