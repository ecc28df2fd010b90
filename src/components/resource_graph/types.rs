//! Graph data structures received from the `/api/v1/graph` endpoint.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::types::nullable;

/// Id of the synthetic node standing in for the public internet.
pub const INTERNET_NODE_ID: &str = "internet-global";

/// Provider assumed when a node does not report one.
const DEFAULT_PROVIDER: &str = "aws";

/// Every resource type the dashboard knows how to present.
///
/// Derivations that depend on the resource type (health, details, styling)
/// match on this enum so that new kinds surface as exhaustiveness errors
/// instead of silently falling through a string lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	/// Synthetic public internet node.
	Internet,
	/// `cloudfront`
	Cloudfront,
	/// `waf_web_acl`
	WafWebAcl,
	/// `waf_ip_set`
	WafIpSet,
	/// `route53`
	Route53,
	/// `alb`
	Alb,
	/// `nlb`
	Nlb,
	/// `elb`
	Elb,
	/// `nat_gateway`
	NatGateway,
	/// `internet_gateway` or `igw`
	InternetGateway,
	/// `vpc`
	Vpc,
	/// `subnet`
	Subnet,
	/// `security_group`
	SecurityGroup,
	/// `ec2`
	Ec2,
	/// `ecs`
	Ecs,
	/// `eks_cluster`
	EksCluster,
	/// `eks_node_group`
	EksNodeGroup,
	/// `lambda`
	Lambda,
	/// `rds`
	Rds,
	/// `s3`
	S3,
	/// `dynamodb`
	Dynamodb,
	/// `elasticache`
	Elasticache,
	/// `cloudwatch_logs`
	CloudwatchLogs,
	/// `iam_role`
	IamRole,
	/// `iam_user`
	IamUser,
	/// Any other type string, kept verbatim.
	Unknown(String),
}

impl ResourceKind {
	/// Maps a wire type string to its kind.
	pub fn parse(resource_type: &str) -> Self {
		match resource_type {
			"internet" => Self::Internet,
			"cloudfront" => Self::Cloudfront,
			"waf_web_acl" => Self::WafWebAcl,
			"waf_ip_set" => Self::WafIpSet,
			"route53" => Self::Route53,
			"alb" => Self::Alb,
			"nlb" => Self::Nlb,
			"elb" => Self::Elb,
			"nat_gateway" => Self::NatGateway,
			"internet_gateway" | "igw" => Self::InternetGateway,
			"vpc" => Self::Vpc,
			"subnet" => Self::Subnet,
			"security_group" => Self::SecurityGroup,
			"ec2" => Self::Ec2,
			"ecs" => Self::Ecs,
			"eks_cluster" => Self::EksCluster,
			"eks_node_group" => Self::EksNodeGroup,
			"lambda" => Self::Lambda,
			"rds" => Self::Rds,
			"s3" => Self::S3,
			"dynamodb" => Self::Dynamodb,
			"elasticache" => Self::Elasticache,
			"cloudwatch_logs" => Self::CloudwatchLogs,
			"iam_role" => Self::IamRole,
			"iam_user" => Self::IamUser,
			other => Self::Unknown(other.to_string()),
		}
	}

	/// Human readable name, `None` for unknown kinds.
	pub fn display_name(&self) -> Option<&'static str> {
		let name = match self {
			Self::Internet => "Internet",
			Self::Cloudfront => "CloudFront",
			Self::WafWebAcl => "WAF Web ACL",
			Self::WafIpSet => "WAF IP Set",
			Self::Route53 => "Route 53",
			Self::Alb => "ALB",
			Self::Nlb => "NLB",
			Self::Elb => "Load Balancer",
			Self::NatGateway => "NAT Gateway",
			Self::InternetGateway => "Internet Gateway",
			Self::Vpc => "VPC",
			Self::Subnet => "Subnet",
			Self::SecurityGroup => "Security Group",
			Self::Ec2 => "EC2 Instance",
			Self::Ecs => "ECS Service",
			Self::EksCluster => "EKS Cluster",
			Self::EksNodeGroup => "EKS Node Group",
			Self::Lambda => "Lambda Function",
			Self::Rds => "RDS Database",
			Self::S3 => "S3 Bucket",
			Self::Dynamodb => "DynamoDB",
			Self::Elasticache => "ElastiCache",
			Self::CloudwatchLogs => "CloudWatch Logs",
			Self::IamRole => "IAM Role",
			Self::IamUser => "IAM User",
			Self::Unknown(_) => return None,
		};
		Some(name)
	}

	/// ALB, NLB or classic ELB.
	pub fn is_load_balancer(&self) -> bool {
		matches!(self, Self::Alb | Self::Nlb | Self::Elb)
	}

	/// Workloads that live inside a subnet and receive load balancer traffic.
	pub fn is_compute(&self) -> bool {
		matches!(
			self,
			Self::Ec2 | Self::Ecs | Self::EksCluster | Self::EksNodeGroup | Self::Lambda
		)
	}

	/// Sensitive data stores: open ingress on these is critical.
	pub fn is_database(&self) -> bool {
		matches!(self, Self::Rds | Self::Dynamodb)
	}
}

/// The CIDR range that admits the whole internet.
pub const UNRESTRICTED_CIDR: &str = "0.0.0.0/0";

/// A cloud resource in the graph snapshot.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ResourceNode {
	/// Globally unique id of the form `<provider>:<type>:<name-or-id>`.
	pub id: String,
	/// Raw resource type string, e.g. `"vpc"` or `"ec2"`.
	#[serde(rename = "type")]
	pub resource_type: String,
	/// Cloud provider, e.g. `"aws"`.
	#[serde(default, deserialize_with = "nullable")]
	pub provider: String,
	/// Provider region.
	#[serde(default, deserialize_with = "nullable")]
	pub region: String,
	/// Resource name as reported.
	#[serde(default, deserialize_with = "nullable")]
	pub name: String,
	/// Resource specific attributes such as `vpc_id` or `ingress_rules`.
	#[serde(default, deserialize_with = "nullable")]
	pub metadata: Map<String, Value>,
	/// Provider tags.
	#[serde(default, deserialize_with = "nullable")]
	pub tags: HashMap<String, String>,
}

impl ResourceNode {
	/// The synthetic internet node, materialized when NAT gateways exist.
	pub fn internet() -> Self {
		Self {
			id: INTERNET_NODE_ID.to_string(),
			resource_type: "internet".to_string(),
			provider: "external".to_string(),
			name: "Internet".to_string(),
			..Self::default()
		}
	}

	/// Parsed [`ResourceKind`].
	pub fn kind(&self) -> ResourceKind {
		ResourceKind::parse(&self.resource_type)
	}

	/// Metadata value as a non-empty string.
	pub fn meta_str(&self, key: &str) -> Option<&str> {
		self.metadata
			.get(key)
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
	}

	/// Bare id of the owning VPC.
	pub fn vpc_id(&self) -> Option<&str> {
		self.meta_str("vpc_id")
	}

	/// Bare id of the owning subnet.
	pub fn subnet_id(&self) -> Option<&str> {
		self.meta_str("subnet_id")
	}

	/// Every string in `ingress_rules[*].cidr_blocks`. Other rule fields are
	/// not inspected, so a rule with odd protocol or port values still counts.
	pub fn ingress_cidr_blocks(&self) -> impl Iterator<Item = &str> {
		self.metadata
			.get("ingress_rules")
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter_map(|rule| rule.get("cidr_blocks"))
			.filter_map(Value::as_array)
			.flatten()
			.filter_map(Value::as_str)
	}

	/// Whether any ingress rule admits [`UNRESTRICTED_CIDR`].
	pub fn has_unrestricted_ingress(&self) -> bool {
		self.ingress_cidr_blocks().any(|c| c == UNRESTRICTED_CIDR)
	}

	/// Builds the node id another resource of `resource_type` would carry
	/// when this node's metadata refers to it by its bare id.
	pub fn reference_id(&self, resource_type: &str, raw_id: &str) -> String {
		let provider = if self.provider.is_empty() {
			DEFAULT_PROVIDER
		} else {
			&self.provider
		};
		format!("{provider}:{resource_type}:{raw_id}")
	}

	/// Last segment of the id after any `:` or `/`.
	pub fn short_id(&self) -> &str {
		self.id
			.rsplit(':')
			.next()
			.and_then(|s| s.rsplit('/').next())
			.filter(|s| !s.is_empty())
			.unwrap_or(&self.id)
	}

	/// The `Name` (or `name`) tag, if set.
	pub fn tag_name(&self) -> Option<&str> {
		self.tags
			.get("Name")
			.or_else(|| self.tags.get("name"))
			.map(String::as_str)
			.filter(|s| !s.is_empty())
	}
}

/// Relationship category of an edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	/// Containment, e.g. VPC to subnet.
	Ownership,
	/// Traffic path.
	Network,
	/// Runtime dependency, e.g. compute to database.
	Dependency,
	/// Any other type string, empty when untyped.
	Other(String),
}

impl EdgeKind {
	/// Maps a wire type string to its kind.
	pub fn parse(edge_type: &str) -> Self {
		match edge_type {
			"ownership" => Self::Ownership,
			"network" => Self::Network,
			"dependency" => Self::Dependency,
			other => Self::Other(other.to_string()),
		}
	}

	/// Wire spelling, `"default"` for an untyped edge.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Ownership => "ownership",
			Self::Network => "network",
			Self::Dependency => "dependency",
			Self::Other(s) if s.is_empty() => "default",
			Self::Other(s) => s,
		}
	}
}

/// A directed relationship between two resources.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ResourceEdge {
	/// Source node id.
	pub from: String,
	/// Target node id.
	pub to: String,
	/// Relationship type string.
	#[serde(rename = "type", default, deserialize_with = "nullable")]
	pub edge_type: String,
	/// Extra attributes as reported.
	#[serde(default)]
	pub metadata: Option<Map<String, Value>>,
}

impl ResourceEdge {
	/// Edge of a known kind without metadata.
	pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
		Self {
			from: from.into(),
			to: to.into(),
			edge_type: kind.as_str().to_string(),
			metadata: None,
		}
	}

	/// Parsed [`EdgeKind`].
	pub fn kind(&self) -> EdgeKind {
		EdgeKind::parse(&self.edge_type)
	}

	/// Identity used to deduplicate edges in the element set.
	pub fn identity(&self) -> String {
		format!("{}-{}:{}", self.from, self.to, self.kind().as_str())
	}
}

/// Complete graph snapshot: nodes and edges.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ResourceGraph {
	/// Every resource.
	#[serde(default, deserialize_with = "nullable")]
	pub nodes: Vec<ResourceNode>,
	/// Reported relationships.
	#[serde(default, deserialize_with = "nullable")]
	pub edges: Vec<ResourceEdge>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_sparse_nodes() {
		let graph: ResourceGraph = serde_json::from_str(
			r#"{
				"nodes": [
					{"id": "aws:vpc:v1", "type": "vpc"},
					{"id": "aws:ec2:i-1", "type": "ec2", "provider": "aws", "region": "us-east-1",
					 "name": "web", "metadata": {"vpc_id": "v1"}, "tags": null}
				],
				"edges": null
			}"#,
		)
		.unwrap();

		assert_eq!(graph.nodes.len(), 2);
		assert!(graph.edges.is_empty());
		assert_eq!(graph.nodes[0].kind(), ResourceKind::Vpc);
		assert_eq!(graph.nodes[1].vpc_id(), Some("v1"));
		assert!(graph.nodes[1].tags.is_empty());
	}

	#[test]
	fn ingress_scan_reads_only_cidr_blocks() {
		let node: ResourceNode = serde_json::from_value(serde_json::json!({
			"id": "aws:security_group:sg-1",
			"type": "security_group",
			"metadata": {
				"ingress_rules": [
					{"protocol": "tcp", "from_port": 22, "cidr_blocks": ["10.0.0.0/8"]},
					"garbage",
					{"protocol": -1, "from_port": "any", "cidr_blocks": ["0.0.0.0/0", 7]}
				]
			}
		}))
		.unwrap();

		let cidrs: Vec<&str> = node.ingress_cidr_blocks().collect();
		assert_eq!(cidrs, vec!["10.0.0.0/8", "0.0.0.0/0"]);
		assert!(node.has_unrestricted_ingress());
	}

	#[test]
	fn missing_or_malformed_ingress_is_not_unrestricted() {
		let mut node = ResourceNode::default();
		assert!(!node.has_unrestricted_ingress());
		node.metadata
			.insert("ingress_rules".into(), serde_json::json!({"cidr_blocks": ["0.0.0.0/0"]}));
		assert!(!node.has_unrestricted_ingress());
	}

	#[test]
	fn reference_ids_use_node_provider() {
		let mut node = ResourceNode {
			id: "gcp:subnet:s1".into(),
			resource_type: "subnet".into(),
			provider: "gcp".into(),
			..Default::default()
		};
		assert_eq!(node.reference_id("vpc", "v1"), "gcp:vpc:v1");
		node.provider.clear();
		assert_eq!(node.reference_id("vpc", "v1"), "aws:vpc:v1");
	}

	#[test]
	fn short_id_strips_prefixes() {
		let node = ResourceNode {
			id: "aws:s3:arn/bucket-a".into(),
			..Default::default()
		};
		assert_eq!(node.short_id(), "bucket-a");
	}

	#[test]
	fn igw_is_an_internet_gateway_alias() {
		assert_eq!(ResourceKind::parse("igw"), ResourceKind::InternetGateway);
		assert_eq!(
			ResourceKind::parse("redshift"),
			ResourceKind::Unknown("redshift".into())
		);
	}

	#[test]
	fn edge_identity_includes_kind() {
		let edge = ResourceEdge::new("a", "b", EdgeKind::Network);
		assert_eq!(edge.identity(), "a-b:network");
		let untyped = ResourceEdge {
			from: "a".into(),
			to: "b".into(),
			..Default::default()
		};
		assert_eq!(untyped.identity(), "a-b:default");
	}
}
