//! Architectural layers used by the layered layout.
//!
//! Each layer owns a fixed horizontal band on the canvas. Bands are ordered
//! top to bottom from the internet down to data stores.

/// A horizontal band of the layered view and the resource types it holds.
#[derive(Debug, PartialEq)]
pub struct LayerDefinition {
	/// Stable key, e.g. `"network"`.
	pub id: &'static str,
	/// Band caption.
	pub label: &'static str,
	/// Top of the band in graph coordinates.
	pub y: f64,
	/// Band height in graph coordinates.
	pub height: f64,
	/// CSS color used for the band fill and label.
	pub color: &'static str,
	/// Resource type strings placed in this band.
	pub member_types: &'static [&'static str],
}

impl LayerDefinition {
	/// Whether a y coordinate falls strictly inside this band.
	pub fn contains_y(&self, y: f64) -> bool {
		y > self.y && y < self.y + self.height
	}
}

/// The five layers, top to bottom.
pub static LAYERS: [LayerDefinition; 5] = [
	LayerDefinition {
		id: "internet",
		label: "Internet",
		y: 50.0,
		height: 100.0,
		color: "#10b981",
		member_types: &["internet"],
	},
	LayerDefinition {
		id: "edge",
		label: "Edge Layer",
		y: 200.0,
		height: 100.0,
		color: "#8b5cf6",
		member_types: &["cloudfront", "waf_web_acl", "waf_ip_set", "route53"],
	},
	LayerDefinition {
		id: "network",
		label: "Network Layer",
		y: 350.0,
		height: 100.0,
		color: "#06b6d4",
		member_types: &[
			"alb",
			"nlb",
			"elb",
			"nat_gateway",
			"internet_gateway",
			"igw",
			"vpc",
			"subnet",
			"security_group",
		],
	},
	LayerDefinition {
		id: "compute",
		label: "Compute Layer",
		y: 500.0,
		height: 100.0,
		color: "#f59e0b",
		member_types: &["ec2", "ecs", "eks_cluster", "eks_node_group", "lambda"],
	},
	LayerDefinition {
		id: "data",
		label: "Data Layer",
		y: 650.0,
		height: 100.0,
		color: "#6366f1",
		member_types: &["rds", "s3", "dynamodb", "elasticache", "cloudwatch_logs"],
	},
];

/// Layer a resource type belongs to, `None` when it sits in no layer.
pub fn classify(resource_type: &str) -> Option<&'static LayerDefinition> {
	LAYERS
		.iter()
		.find(|layer| layer.member_types.contains(&resource_type))
}

/// Whether a layer groups its nodes by VPC in the layered view.
pub fn groups_by_vpc(layer: &LayerDefinition) -> bool {
	matches!(layer.id, "network" | "compute")
}
