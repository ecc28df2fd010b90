//! Declarative visual style for nodes and edges.
//!
//! All colors and sizes live here so the renderer only draws what it is
//! told. Lookups are pure and keyed on kind, health and exposure.

use super::health::Health;
use super::types::{EdgeKind, ResourceKind};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha, 0.0 to 1.0.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color, different alpha.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		self.lerp(Self::rgba(255, 255, 255, self.a), factor)
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - t) + f64::from(b) * t).round() as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	/// `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses `#rrggbb`.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let hex = hex.strip_prefix('#')?;
		if hex.len() != 6 {
			return None;
		}
		let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
		Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
	}
}

/// Border of a healthy node.
pub const HEALTHY: Color = Color::rgb(0x1d, 0x81, 0x02);
/// Border of a node with open ingress.
pub const WARNING: Color = Color::rgb(0xf5, 0x9e, 0x0b);
/// Border of a database with open ingress.
pub const CRITICAL: Color = Color::rgb(0xd1, 0x32, 0x12);
/// Highlight ring of the selected node.
pub const SELECTED: Color = Color::rgb(0xff, 0x99, 0x00);

const NODE_BASE: Color = Color::rgb(0x23, 0x2f, 0x3e);
const INTERNET_FILL: Color = Color::rgb(0x0f, 0x17, 0x2a);
const INTERNET_BORDER: Color = Color::rgb(0x10, 0xb9, 0x81);

const HEALTH_BORDER_WIDTH: f64 = 4.0;
const PUBLIC_BORDER_WIDTH: f64 = 5.0;
/// Stroke width of the selection ring.
pub const SELECTED_BORDER_WIDTH: f64 = 6.0;

/// How a border or edge line is stroked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
	/// Continuous stroke.
	#[default]
	Solid,
	/// Long dashes.
	Dashed,
	/// Short dots.
	Dotted,
	/// Two concentric strokes.
	Double,
}

impl LineStyle {
	/// Canvas dash segments for a given line width.
	pub fn dash(self, width: f64) -> Option<(f64, f64)> {
		match self {
			Self::Solid | Self::Double => None,
			Self::Dashed => Some((width * 4.0, width * 3.0)),
			Self::Dotted => Some((width, width * 2.0)),
		}
	}
}

/// Resolved look of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	/// Short glyph drawn inside the node.
	pub icon: &'static str,
	/// Node body.
	pub fill: Color,
	/// Type accent, used for the icon and label tint.
	pub accent: Color,
	/// Health color, or the kind accent for the internet node.
	pub border_color: Color,
	/// Border stroke in graph units.
	pub border_width: f64,
	/// Double for public nodes.
	pub border_style: LineStyle,
	/// Diameter in graph units.
	pub size: f64,
}

/// Resolved look of one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	/// Stroke color.
	pub color: Color,
	/// Stroke width in graph units.
	pub width: f64,
	/// Dash pattern.
	pub line: LineStyle,
}

/// Accent color, diameter and glyph per resource kind.
fn kind_traits(kind: &ResourceKind) -> (Color, f64, &'static str) {
	use ResourceKind::*;
	match kind {
		Internet => (INTERNET_BORDER, 100.0, "🌐"),
		Vpc => (Color::rgb(0x09, 0x72, 0xd3), 90.0, "VPC"),
		Subnet => (Color::rgb(0x7a, 0xa1, 0x16), 70.0, "SN"),
		SecurityGroup => (Color::rgb(0xdd, 0x34, 0x4c), 65.0, "SG"),
		Ec2 => (Color::rgb(0xff, 0x99, 0x00), 60.0, "EC2"),
		Ecs => (Color::rgb(0xff, 0x99, 0x00), 60.0, "ECS"),
		EksCluster => (Color::rgb(0xff, 0x99, 0x00), 80.0, "EKS"),
		EksNodeGroup => (Color::rgb(0x00, 0xac, 0xc1), 65.0, "NG"),
		Lambda => (Color::rgb(0xff, 0x99, 0x00), 60.0, "λ"),
		Rds => (Color::rgb(0x52, 0x7f, 0xff), 70.0, "RDS"),
		Dynamodb => (Color::rgb(0x52, 0x7f, 0xff), 65.0, "DDB"),
		Elasticache => (Color::rgb(0x52, 0x7f, 0xff), 65.0, "EC"),
		S3 => (Color::rgb(0x56, 0x9a, 0x31), 65.0, "S3"),
		Alb | Nlb | Elb => (Color::rgb(0x8c, 0x4f, 0xff), 70.0, "LB"),
		NatGateway => (Color::rgb(0x7a, 0xa1, 0x16), 65.0, "NAT"),
		InternetGateway => (INTERNET_BORDER, 70.0, "IGW"),
		WafWebAcl | WafIpSet => (Color::rgb(0xdd, 0x34, 0x4c), 65.0, "WAF"),
		Cloudfront => (Color::rgb(0x8c, 0x4f, 0xff), 65.0, "CF"),
		Route53 => (Color::rgb(0x8c, 0x4f, 0xff), 65.0, "R53"),
		CloudwatchLogs => (Color::rgb(0xff, 0x99, 0x00), 55.0, "CW"),
		IamRole | IamUser => (Color::rgb(0xdd, 0x34, 0x4c), 50.0, "IAM"),
		Unknown(_) => (Color::rgb(0x54, 0x5b, 0x64), 60.0, "?"),
	}
}

/// Border color for a health state.
pub fn health_color(health: Health) -> Color {
	match health {
		Health::Healthy => HEALTHY,
		Health::Warning => WARNING,
		Health::Critical => CRITICAL,
	}
}

/// Style for a node. Health sets the border color; public exposure doubles
/// the border.
pub fn node_style(kind: &ResourceKind, health: Health, public: bool) -> NodeStyle {
	let (accent, size, icon) = kind_traits(kind);

	if *kind == ResourceKind::Internet {
		return NodeStyle {
			icon,
			fill: INTERNET_FILL,
			accent,
			border_color: INTERNET_BORDER,
			border_width: HEALTH_BORDER_WIDTH,
			border_style: LineStyle::Solid,
			size,
		};
	}

	let (border_width, border_style) = if public {
		(PUBLIC_BORDER_WIDTH, LineStyle::Double)
	} else {
		(HEALTH_BORDER_WIDTH, LineStyle::Solid)
	};

	NodeStyle {
		icon,
		fill: NODE_BASE.lerp(accent, 0.2),
		accent,
		border_color: health_color(health),
		border_width,
		border_style,
		size,
	}
}

/// Style for an edge kind. Unknown kinds get a thin grey line.
pub fn edge_style(kind: &EdgeKind) -> EdgeStyle {
	match kind {
		EdgeKind::Network => EdgeStyle {
			color: Color::rgb(0x06, 0xb6, 0xd4),
			width: 3.0,
			line: LineStyle::Solid,
		},
		EdgeKind::Ownership => EdgeStyle {
			color: Color::rgb(0x09, 0x72, 0xd3),
			width: 2.0,
			line: LineStyle::Dashed,
		},
		EdgeKind::Dependency => EdgeStyle {
			color: Color::rgb(0xf5, 0x9e, 0x0b),
			width: 2.0,
			line: LineStyle::Dotted,
		},
		EdgeKind::Other(_) => EdgeStyle {
			color: Color::rgb(0x54, 0x5b, 0x64),
			width: 2.0,
			line: LineStyle::Solid,
		},
	}
}

/// Canvas background colors.
#[derive(Clone, Debug)]
pub struct Background {
	/// Base fill.
	pub color: Color,
	/// Gradient edge color.
	pub color_secondary: Color,
	/// Vignette intensity (0.0 = none, 1.0 = strong)
	pub vignette: f64,
}

impl Default for Background {
	fn default() -> Self {
		Self {
			color: Color::rgb(22, 27, 34),
			color_secondary: Color::rgb(30, 35, 42),
			vignette: 0.15,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn health_sets_border_color() {
		let kind = ResourceKind::Ec2;
		assert_eq!(node_style(&kind, Health::Healthy, false).border_color, HEALTHY);
		assert_eq!(node_style(&kind, Health::Warning, false).border_color, WARNING);
		let critical = node_style(&ResourceKind::Rds, Health::Critical, false);
		assert_eq!(critical.border_color, CRITICAL);
		assert_eq!(critical.border_width, 4.0);
		assert_eq!(critical.border_style, LineStyle::Solid);
	}

	#[test]
	fn public_nodes_get_a_double_border() {
		let style = node_style(&ResourceKind::S3, Health::Warning, true);
		assert_eq!(style.border_style, LineStyle::Double);
		assert_eq!(style.border_width, 5.0);
		assert_eq!(style.border_color, WARNING);
	}

	#[test]
	fn internet_node_keeps_its_own_look() {
		let style = node_style(&ResourceKind::Internet, Health::Healthy, true);
		assert_eq!(style.size, 100.0);
		assert_eq!(style.fill.to_css(), "#0f172a");
		assert_eq!(style.border_color.to_css(), "#10b981");
		assert_eq!(style.border_style, LineStyle::Solid);
	}

	#[test]
	fn sizes_follow_the_kind() {
		let size = |t: &str| node_style(&ResourceKind::parse(t), Health::Healthy, false).size;
		assert_eq!(size("vpc"), 90.0);
		assert_eq!(size("eks_cluster"), 80.0);
		assert_eq!(size("iam_role"), 50.0);
		assert_eq!(size("something_else"), 60.0);
		assert_eq!(size("igw"), size("internet_gateway"));
	}

	#[test]
	fn edge_styles() {
		let network = edge_style(&EdgeKind::Network);
		assert_eq!((network.color.to_css().as_str(), network.width), ("#06b6d4", 3.0));
		assert_eq!(edge_style(&EdgeKind::Ownership).line, LineStyle::Dashed);
		assert_eq!(edge_style(&EdgeKind::Dependency).line, LineStyle::Dotted);
		assert_eq!(
			edge_style(&EdgeKind::Other("peering".into())).color.to_css(),
			"#545b64"
		);
	}

	#[test]
	fn color_helpers() {
		assert_eq!(Color::from_hex("#d13212"), Some(CRITICAL));
		assert_eq!(Color::from_hex("d13212"), None);
		assert_eq!(Color::from_hex("#xyz123"), None);
		assert_eq!(Color::rgb(0, 0, 0).lighten(1.0).to_css(), "#ffffff");
		assert_eq!(
			Color::rgb(10, 20, 30).with_alpha(0.5).to_css(),
			"rgba(10, 20, 30, 0.5)"
		);
	}
}
