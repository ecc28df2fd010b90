//! Wire types of the drift detection REST API.
//!
//! Numeric and map fields default to zero/empty when the backend omits them,
//! and unrecognized enum strings land in an `Unknown` variant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// How serious a drift is.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	/// `low`
	Low,
	/// `medium`
	Medium,
	/// `high`
	High,
	/// `critical`
	Critical,
	/// Any value this client does not recognize.
	#[default]
	#[serde(other)]
	Unknown,
}

impl Severity {
	/// Known severities from most to least severe.
	pub const ORDERED: [Severity; 4] = [
		Severity::Critical,
		Severity::High,
		Severity::Medium,
		Severity::Low,
	];

	/// Sort rank, higher is more severe.
	pub fn rank(self) -> u8 {
		match self {
			Self::Critical => 4,
			Self::High => 3,
			Self::Medium => 2,
			Self::Low => 1,
			Self::Unknown => 0,
		}
	}

	/// Wire spelling.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
			Self::Critical => "critical",
			Self::Unknown => "unknown",
		}
	}

	/// Parses a known severity, `None` for anything else.
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ORDERED.into_iter().find(|s| s.as_str() == key)
	}
}

/// What happened to the resource.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DriftType {
	/// The resource appeared outside of Terraform.
	Created,
	/// Attributes differ from the Terraform state.
	Modified,
	/// The resource was removed outside of Terraform.
	Deleted,
	/// Any value this client does not recognize.
	#[default]
	#[serde(other)]
	Unknown,
}

impl DriftType {
	/// Known drift types in display order.
	pub const ALL: [DriftType; 3] = [DriftType::Created, DriftType::Modified, DriftType::Deleted];

	/// Wire spelling.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Created => "created",
			Self::Modified => "modified",
			Self::Deleted => "deleted",
			Self::Unknown => "unknown",
		}
	}

	/// Parses a known drift type, `None` for anything else.
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.as_str() == key)
	}
}

/// Who or what caused a drift, from the audit trail.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RootCause {
	/// Principal that made the change.
	#[serde(default, deserialize_with = "nullable")]
	pub user_identity: String,
	/// API call name, e.g. `ModifyInstanceAttribute`.
	#[serde(default, deserialize_with = "nullable")]
	pub event_name: String,
	/// Audit trail event id.
	#[serde(default, deserialize_with = "nullable")]
	pub cloudtrail_event_id: String,
	/// Full ARN of the principal.
	#[serde(default, deserialize_with = "nullable")]
	pub user_arn: String,
	/// Caller address.
	#[serde(default, deserialize_with = "nullable")]
	pub source_ip: String,
}

/// One detected configuration drift.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DriftEvent {
	/// Event id.
	pub id: String,
	/// Drifted resource id.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_id: String,
	/// Terraform-style resource type.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_type: String,
	/// What changed.
	#[serde(rename = "type", default)]
	pub drift_type: DriftType,
	/// Assigned severity.
	#[serde(default)]
	pub severity: Severity,
	/// Detection time.
	pub timestamp: DateTime<Utc>,
	/// Attribution, when the audit trail had one.
	#[serde(default)]
	pub root_cause: Option<RootCause>,
	/// Attribute level differences as reported.
	#[serde(default)]
	pub diff: Option<Map<String, Value>>,
}

impl DriftEvent {
	/// Non-empty root cause principal.
	pub fn user_identity(&self) -> Option<&str> {
		self.root_cause
			.as_ref()
			.map(|rc| rc.user_identity.as_str())
			.filter(|s| !s.is_empty())
	}
}

/// A resource reached from the drifted one during impact analysis.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AffectedResource {
	/// Resource id.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_id: String,
	/// Resource type.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_type: String,
	/// Edge kind that led here.
	#[serde(default, deserialize_with = "nullable")]
	pub relation_type: String,
	/// Hops from the drifted resource.
	#[serde(default)]
	pub distance: u32,
	/// Free text explanation.
	#[serde(default, deserialize_with = "nullable")]
	pub impact_description: String,
}

/// Blast radius analysis of one drift event.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ImpactAnalysisResult {
	/// Event this analysis belongs to.
	#[serde(default, deserialize_with = "nullable")]
	pub drift_event_id: String,
	/// Number of resources reached.
	#[serde(default)]
	pub affected_resource_count: u32,
	/// Maximum hop distance reached.
	#[serde(default)]
	pub blast_radius: u32,
	/// Severity after impact weighting.
	#[serde(default)]
	pub severity: Severity,
	/// Suggested remediation steps.
	#[serde(default, deserialize_with = "nullable")]
	pub recommendations: Vec<String>,
	/// Every affected resource.
	#[serde(default, deserialize_with = "nullable")]
	pub affected_resources: Vec<AffectedResource>,
}

/// Aggregate counts over a window of days.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DriftStats {
	/// Drifts in the window.
	#[serde(default)]
	pub total_count: u64,
	/// Counts keyed by severity string.
	#[serde(default, deserialize_with = "nullable")]
	pub by_severity: HashMap<String, u64>,
	/// Counts keyed by drift type string.
	#[serde(default, deserialize_with = "nullable")]
	pub by_type: HashMap<String, u64>,
	/// Counts keyed by resource type.
	#[serde(default, deserialize_with = "nullable")]
	pub by_resource_type: HashMap<String, u64>,
}

/// Aggregate impact analysis figures over a window of days.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ImpactStats {
	/// Analyses in the window.
	#[serde(default)]
	pub total_analyzed: u64,
	/// Mean blast radius.
	#[serde(default)]
	pub avg_blast_radius: f64,
	/// Mean affected resource count.
	#[serde(default)]
	pub avg_affected_resources: f64,
	/// Most affected resource types with counts.
	#[serde(default, deserialize_with = "nullable")]
	pub top_affected_resource_types: HashMap<String, u64>,
}

/// A drift ranked by its impact.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HighImpactDrift {
	/// Event id.
	pub id: String,
	/// Drifted resource id.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_id: String,
	/// Resource type.
	#[serde(default, deserialize_with = "nullable")]
	pub resource_type: String,
	/// What changed.
	#[serde(default)]
	pub drift_type: DriftType,
	/// Detection time.
	pub timestamp: DateTime<Utc>,
	/// Number of resources reached.
	#[serde(default)]
	pub affected_resource_count: u32,
	/// Maximum hop distance reached.
	#[serde(default)]
	pub blast_radius: u32,
	/// Severity after impact weighting.
	#[serde(default)]
	pub severity: Severity,
}

/// Body of `GET /api/v1/drifts`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DriftList {
	/// Matching events, newest first.
	#[serde(default, deserialize_with = "nullable")]
	pub drifts: Vec<DriftEvent>,
	/// Number of events returned.
	#[serde(default)]
	pub count: u64,
}

/// Body of `GET /api/v1/impact`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ImpactList {
	/// Matching analyses.
	#[serde(default, deserialize_with = "nullable")]
	pub results: Vec<ImpactAnalysisResult>,
	/// Number of analyses returned.
	#[serde(default)]
	pub count: u64,
}

/// Body of `GET /api/v1/drifts/stats`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DriftStatsResponse {
	/// The figures.
	#[serde(default)]
	pub stats: DriftStats,
	/// Window the figures cover.
	#[serde(default)]
	pub days: u32,
}

/// Body of `GET /api/v1/impact/stats`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ImpactStatsResponse {
	/// The figures.
	#[serde(default)]
	pub stats: ImpactStats,
	/// Window the figures cover.
	#[serde(default)]
	pub days: u32,
}

/// Body of `GET /api/v1/impact/high`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct HighImpactList {
	/// Drifts ranked by impact.
	#[serde(default, deserialize_with = "nullable")]
	pub drifts: Vec<HighImpactDrift>,
	/// Number returned.
	#[serde(default)]
	pub count: u64,
	/// Window searched.
	#[serde(default)]
	pub days: u32,
}

/// Body of `GET /health`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct HealthStatus {
	/// `"ok"` when the backend is healthy.
	#[serde(default, deserialize_with = "nullable")]
	pub status: String,
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	#[test]
	fn drift_event_with_root_cause() {
		let event: DriftEvent = serde_json::from_str(
			r#"{
				"id": "d-1",
				"resource_id": "aws:security_group:sg-1",
				"resource_type": "security_group",
				"type": "modified",
				"severity": "high",
				"timestamp": "2024-03-01T12:30:00Z",
				"root_cause": {"user_identity": "alice", "event_name": "AuthorizeSecurityGroupIngress"}
			}"#,
		)
		.unwrap();

		assert_eq!(event.drift_type, DriftType::Modified);
		assert_eq!(event.severity, Severity::High);
		assert_eq!(
			event.timestamp,
			Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
		);
		assert_eq!(event.user_identity(), Some("alice"));
	}

	#[test]
	fn unknown_enum_strings_do_not_fail() {
		let event: DriftEvent = serde_json::from_str(
			r#"{"id": "d", "type": "renamed", "severity": "catastrophic",
			    "timestamp": "2024-03-01T00:00:00+09:00"}"#,
		)
		.unwrap();
		assert_eq!(event.drift_type, DriftType::Unknown);
		assert_eq!(event.severity, Severity::Unknown);
		assert_eq!(event.user_identity(), None);
		assert_eq!(event.timestamp.to_rfc3339(), "2024-02-29T15:00:00+00:00");
	}

	#[test]
	fn stats_default_when_missing_or_null() {
		let resp: DriftStatsResponse =
			serde_json::from_str(r#"{"stats": {"by_severity": null}, "days": 7}"#).unwrap();
		assert_eq!(resp.stats.total_count, 0);
		assert!(resp.stats.by_severity.is_empty());
		assert_eq!(resp.days, 7);

		let impact: ImpactStatsResponse = serde_json::from_str("{}").unwrap();
		assert_eq!(impact.stats.avg_blast_radius, 0.0);
	}

	#[test]
	fn impact_result_with_null_lists() {
		let result: ImpactAnalysisResult = serde_json::from_str(
			r#"{"drift_event_id": "d", "affected_resource_count": 3, "blast_radius": 2,
			    "severity": "critical", "recommendations": null, "affected_resources": null}"#,
		)
		.unwrap();
		assert_eq!(result.blast_radius, 2);
		assert!(result.recommendations.is_empty());
		assert!(result.affected_resources.is_empty());
	}

	#[test]
	fn severity_rank_orders_known_values() {
		let ranks: Vec<u8> = Severity::ORDERED.iter().map(|s| s.rank()).collect();
		assert_eq!(ranks, vec![4, 3, 2, 1]);
		assert!(Severity::Low.rank() > Severity::Unknown.rank());
		assert_eq!(Severity::from_key("medium"), Some(Severity::Medium));
		assert_eq!(Severity::from_key("unknown"), None);
	}
}
