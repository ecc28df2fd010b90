//! Presentation attributes derived from a single node: health, public
//! exposure, display label and per-kind details.

use serde_json::Value;

use super::layers::{LayerDefinition, classify};
use super::types::{ResourceKind, ResourceNode};

/// Security posture of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Health {
	/// No open ingress.
	#[default]
	Healthy,
	/// Open ingress on a non-database resource.
	Warning,
	/// Open ingress on a database.
	Critical,
}

impl Health {
	/// Display name.
	pub fn label(self) -> &'static str {
		match self {
			Self::Healthy => "Healthy",
			Self::Warning => "Warning",
			Self::Critical => "Critical",
		}
	}
}

/// Open ingress is a warning, and critical on a database.
pub fn determine_health(node: &ResourceNode) -> Health {
	if !node.has_unrestricted_ingress() {
		Health::Healthy
	} else if node.kind().is_database() {
		Health::Critical
	} else {
		Health::Warning
	}
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::String(s) => !s.is_empty(),
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Reachable from the internet: has a public IP, is flagged public, or
/// admits `0.0.0.0/0`.
pub fn is_public(node: &ResourceNode) -> bool {
	node.metadata.get("public_ip").is_some_and(truthy)
		|| node.metadata.get("is_public").is_some_and(truthy)
		|| node.has_unrestricted_ingress()
}

/// `"<Type> (<Name tag>)"`, falling back to the type name, the tag and
/// finally the short id.
pub fn node_label(node: &ResourceNode) -> String {
	let kind = node.kind();
	match (kind.display_name(), node.tag_name()) {
		(Some(type_label), Some(tag)) => format!("{type_label} ({tag})"),
		(Some(type_label), None) => type_label.to_string(),
		(None, Some(tag)) => tag.to_string(),
		(None, None) => node.short_id().to_string(),
	}
}

fn display_value(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Bool(true) => Some("Yes".into()),
		Value::Bool(false) => Some("No".into()),
		other => Some(other.to_string()),
	}
}

fn rule_count(node: &ResourceNode, key: &str) -> String {
	node.metadata
		.get(key)
		.and_then(Value::as_array)
		.map_or(0, Vec::len)
		.to_string()
}

/// Kind specific attributes shown in the details panel. Absent metadata
/// values are omitted.
pub fn node_details(node: &ResourceNode) -> Vec<(&'static str, String)> {
	let fields: &[(&str, &str)] = match node.kind() {
		ResourceKind::Ec2 => &[
			("Instance type", "instance_type"),
			("State", "state"),
			("Private IP", "private_ip"),
			("Public IP", "public_ip"),
		],
		ResourceKind::Rds => &[
			("Engine", "engine"),
			("Engine version", "engine_version"),
			("Instance class", "instance_class"),
			("Allocated storage", "allocated_storage"),
			("Multi-AZ", "multi_az"),
		],
		ResourceKind::EksCluster => &[
			("Version", "version"),
			("Status", "status"),
			("Endpoint", "endpoint"),
		],
		ResourceKind::S3 => &[("Versioning", "versioning"), ("Encryption", "encryption")],
		ResourceKind::SecurityGroup => {
			return vec![
				("Ingress rules", rule_count(node, "ingress_rules")),
				("Egress rules", rule_count(node, "egress_rules")),
			];
		}
		_ => &[],
	};

	fields
		.iter()
		.filter_map(|&(label, key)| {
			let value = node.metadata.get(key).and_then(display_value)?;
			Some((label, value))
		})
		.collect()
}

/// A node together with everything derived from it for display.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
	/// The source node.
	pub node: ResourceNode,
	/// Parsed kind.
	pub kind: ResourceKind,
	/// Display label.
	pub label: String,
	/// Derived health.
	pub health: Health,
	/// Reachable from the internet.
	pub public: bool,
	/// Layer band, `None` for unclassified types.
	pub layer: Option<&'static LayerDefinition>,
	/// Kind specific attributes for the details panel.
	pub details: Vec<(&'static str, String)>,
}

impl NodeView {
	/// Derives every display attribute of `node`.
	pub fn new(node: ResourceNode) -> Self {
		Self {
			kind: node.kind(),
			label: node_label(&node),
			health: determine_health(&node),
			public: is_public(&node),
			layer: classify(&node.resource_type),
			details: node_details(&node),
			node,
		}
	}

	/// Node id.
	pub fn id(&self) -> &str {
		&self.node.id
	}

	/// `provider:region`, omitting empty parts.
	pub fn location(&self) -> String {
		match (self.node.provider.as_str(), self.node.region.as_str()) {
			("", "") => String::new(),
			(p, "") => p.to_string(),
			("", r) => r.to_string(),
			(p, r) => format!("{p}:{r}"),
		}
	}
}
