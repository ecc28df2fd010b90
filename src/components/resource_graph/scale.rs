//! Zoom-dependent scaling of graph visuals.
//!
//! Node diameters come from the style table in world units and scale with
//! the view. Text, line widths and arrows use the behaviors below so they
//! stay legible when zoomed far out.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped {
		/// Smallest on-screen size in pixels.
		min_screen: f64,
		/// Largest on-screen size in pixels.
		max_screen: f64,
	},
}

impl ScaleBehavior {
	/// World-space value for a base value at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Fades a visual in between two zoom levels.
#[derive(Clone, Debug)]
pub struct Fade {
	/// Zoom at which the visual is fully transparent.
	pub zero_alpha_k: f64,
	/// Zoom at which the visual is fully opaque.
	pub full_alpha_k: f64,
}

impl Fade {
	/// Alpha at zoom `k`.
	pub fn apply(&self, k: f64) -> f64 {
		if self.zero_alpha_k == self.full_alpha_k {
			return 1.0;
		}
		((k - self.zero_alpha_k) / (self.full_alpha_k - self.zero_alpha_k)).clamp(0.0, 1.0)
	}
}

/// Base sizes and scaling rules for one graph.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Label font size in world units.
	pub label_size: f64,
	/// How labels scale with zoom.
	pub label_behavior: ScaleBehavior,
	/// Labels disappear below this zoom.
	pub label_fade: Fade,
	/// Icon glyph size relative to the node diameter.
	pub icon_ratio: f64,
	/// Minimum edge stroke in screen pixels.
	pub min_edge_width: f64,
	/// Arrowhead length in world units.
	pub arrow_size: f64,
	/// How arrowheads scale with zoom.
	pub arrow_behavior: ScaleBehavior,
	/// Extra pick radius around a node, in screen pixels.
	pub hit_slop: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			label_size: 12.0,
			label_behavior: ScaleBehavior::Clamped {
				min_screen: 9.0,
				max_screen: 18.0,
			},
			label_fade: Fade {
				zero_alpha_k: 0.25,
				full_alpha_k: 0.45,
			},
			icon_ratio: 0.3,
			min_edge_width: 1.0,
			arrow_size: 9.0,
			arrow_behavior: ScaleBehavior::Clamped {
				min_screen: 4.0,
				max_screen: 14.0,
			},
			hit_slop: 4.0,
		}
	}
}

/// Pre-computed scale values for one frame. Sizes are in world space.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom these values were computed for.
	pub k: f64,
	/// CSS font shorthand for labels.
	pub label_font: String,
	/// Label font size.
	pub label_size: f64,
	/// Label opacity.
	pub label_alpha: f64,
	/// Icon glyph size relative to the node diameter.
	pub icon_ratio: f64,
	/// Arrowhead length.
	pub arrow_size: f64,
	/// Extra pick radius.
	pub hit_slop: f64,
	min_edge_width: f64,
}

impl ScaledValues {
	/// Evaluates `config` at zoom `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_size = config.label_behavior.apply(config.label_size, k);
		Self {
			k,
			label_font: format!("{label_size}px sans-serif"),
			label_size,
			label_alpha: config.label_fade.apply(k),
			icon_ratio: config.icon_ratio,
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
			hit_slop: ScaleBehavior::Screen.apply(config.hit_slop, k),
			min_edge_width: config.min_edge_width,
		}
	}

	/// Edge stroke in world units, never thinner than the screen minimum.
	pub fn edge_width(&self, base: f64) -> f64 {
		base.max(self.min_edge_width / self.k)
	}

	/// Font for a node's icon glyph.
	pub fn icon_font(&self, diameter: f64) -> String {
		format!("bold {}px sans-serif", diameter * self.icon_ratio)
	}
}
