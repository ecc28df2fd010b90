//! Leptos component wrapping the resource graph canvas.
//!
//! Creates the canvas, wires mouse, wheel and touch handlers for dragging,
//! panning, zooming and selection, and drives an animation loop through
//! `requestAnimationFrame`. The element set and layout mode arrive as
//! signals and are pushed into the [`GraphSurface`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use super::elements::ElementSet;
use super::health::NodeView;
use super::layout::LayoutMode;
use super::render;
use super::state::GraphState;
use super::style::Background;
use super::surface::GraphSurface;

type SharedState = Rc<RefCell<Option<GraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

const DEFAULT_SIZE: (f64, f64) = (800.0, 600.0);

/// Size of the canvas's parent container.
fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (f64::from(p.client_width()), f64::from(p.client_height())))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or(DEFAULT_SIZE)
}

/// Pointer position relative to the canvas.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		f64::from(ev.client_x()) - rect.left(),
		f64::from(ev.client_y()) - rect.top(),
	))
}

/// Canvas-relative positions of the first two active touches.
fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<(f64, f64)> {
	let Some(canvas) = canvas_ref.get() else {
		return Vec::new();
	};
	let canvas: HtmlCanvasElement = canvas.into();
	let rect = canvas.get_bounding_client_rect();
	let touches = ev.touches();
	(0..touches.length().min(2))
		.filter_map(|i| touches.get(i))
		.map(|t| {
			(
				f64::from(t.client_x()) - rect.left(),
				f64::from(t.client_y()) - rect.top(),
			)
		})
		.collect()
}

/// Distance between two fingers.
fn spread(a: (f64, f64), b: (f64, f64)) -> f64 {
	(a.0 - b.0).hypot(a.1 - b.1)
}

/// Zoom step for a pinch that moved from `before` to `after` spread, and the
/// point it is anchored at. `None` when either spread is degenerate.
fn pinch_zoom(before: f64, a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), f64)> {
	let after = spread(a, b);
	if before < 1.0 || after < 1.0 {
		return None;
	}
	let centre = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
	Some((centre, after / before))
}

/// Renders the resource graph on a canvas that fills its parent.
///
/// `selected` is written when the user clicks a node and cleared when the
/// background is clicked.
#[component]
pub fn ResourceGraphCanvas(
	#[prop(into)] elements: Signal<ElementSet>,
	#[prop(into)] mode: Signal<LayoutMode>,
	selected: RwSignal<Option<NodeView>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let (state_init, animate_init, resize_init) = (state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("drift-graph: canvas 2d context unavailable");
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let mut graph = GraphState::new(w, h);
		graph.on_node_select(Box::new(move |view| selected.set(view.cloned())));
		graph.set_layout(mode.get_untracked());
		graph.set_elements(elements.get_untracked());
		*state_init.borrow_mut() = Some(graph);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(s) = state_resize.borrow_mut().as_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(cb) = resize_init.borrow().as_ref() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let background = Background::default();
		let (state_anim, animate_inner, resize_inner, alive) = (
			state_init.clone(),
			animate_init.clone(),
			resize_init.clone(),
			alive.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			if !alive.load(Ordering::Relaxed) {
				if let Some(cb) = resize_inner.borrow().as_ref() {
					let _ = window
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				debug!("drift-graph: graph canvas unmounted, animation stopped");
				return;
			}
			if let Some(s) = state_anim.borrow_mut().as_mut() {
				s.tick(0.016);
				render::render(s, &ctx, &background);
			}
			if let Some(cb) = animate_inner.borrow().as_ref() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_elements = state.clone();
	Effect::new(move |_| {
		let next = elements.get();
		if let Some(s) = state_elements.borrow_mut().as_mut() {
			s.set_elements(next);
		}
	});

	let state_mode = state.clone();
	Effect::new(move |_| {
		let next = mode.get();
		if let Some(s) = state_mode.borrow_mut().as_mut() {
			if s.mode() != next {
				s.set_layout(next);
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_md.borrow_mut().as_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_mm.borrow_mut().as_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(s) = state_mu.borrow_mut().as_mut() {
			s.release();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			s.cancel_gesture();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_wh.borrow_mut().as_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	// Finger spread of an active two-finger pinch.
	let pinch: Rc<Cell<Option<f64>>> = Rc::new(Cell::new(None));

	let (state_ts, pinch_ts) = (state.clone(), pinch.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		let mut guard = state_ts.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		match points.as_slice() {
			[p] => {
				pinch_ts.set(None);
				s.press(p.0, p.1);
			}
			[a, b] => {
				s.cancel_gesture();
				pinch_ts.set(Some(spread(*a, *b)));
			}
			_ => {}
		}
	};

	let (state_tm, pinch_tm) = (state.clone(), pinch.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		let mut guard = state_tm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		match (points.as_slice(), pinch_tm.get()) {
			([a, b], Some(before)) => {
				if let Some(((cx, cy), factor)) = pinch_zoom(before, *a, *b) {
					s.zoom_at(cx, cy, factor);
					pinch_tm.set(Some(spread(*a, *b)));
				}
			}
			([p], None) => s.pointer_move(p.0, p.1),
			_ => {}
		}
	};

	let (state_te, pinch_te) = (state.clone(), pinch.clone());
	let on_touchend = move |ev: TouchEvent| {
		let remaining = ev.touches().length();
		let mut guard = state_te.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if pinch_te.get().is_some() {
			if remaining == 0 {
				pinch_te.set(None);
			}
		} else if remaining == 0 {
			s.release();
		}
	};

	let state_tc = state.clone();
	let on_touchcancel = move |_: TouchEvent| {
		pinch.set(None);
		if let Some(s) = state_tc.borrow_mut().as_mut() {
			s.cancel_gesture();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="resource-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pinch_zoom_scales_by_spread_ratio_around_the_midpoint() {
		let (centre, factor) = pinch_zoom(100.0, (0.0, 0.0), (200.0, 0.0)).unwrap();
		assert_eq!(centre, (100.0, 0.0));
		assert!((factor - 2.0).abs() < 1e-9);

		let (_, factor) = pinch_zoom(100.0, (10.0, 10.0), (40.0, 50.0)).unwrap();
		assert!((factor - 0.5).abs() < 1e-9);
	}

	#[test]
	fn degenerate_pinch_is_ignored() {
		assert!(pinch_zoom(0.0, (0.0, 0.0), (50.0, 0.0)).is_none());
		assert!(pinch_zoom(80.0, (5.0, 5.0), (5.0, 5.0)).is_none());
	}
}
