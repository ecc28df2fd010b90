//! Query parameters for the list endpoints. Unset values are omitted.

use chrono::{DateTime, SecondsFormat, Utc};

use super::types::{DriftType, Severity};

/// Accumulates `key=value` pairs, skipping anything unset or empty.
#[derive(Default)]
struct Pairs(Vec<(&'static str, String)>);

impl Pairs {
	fn number(mut self, key: &'static str, value: Option<u32>) -> Self {
		if let Some(v) = value {
			self.0.push((key, v.to_string()));
		}
		self
	}

	fn text(mut self, key: &'static str, value: Option<&str>) -> Self {
		if let Some(v) = value.filter(|v| !v.is_empty()) {
			self.0.push((key, v.to_string()));
		}
		self
	}

	fn time(self, key: &'static str, value: Option<DateTime<Utc>>) -> Self {
		let formatted = value.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
		self.text(key, formatted.as_deref())
	}
}

/// Filters for `GET /api/v1/drifts`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriftQuery {
	/// Maximum number of events.
	pub limit: Option<u32>,
	/// Exact resource type.
	pub resource_type: Option<String>,
	/// Exact severity.
	pub severity: Option<Severity>,
	/// Exact drift type.
	pub drift_type: Option<DriftType>,
	/// Root cause principal.
	pub user_identity: Option<String>,
	/// Earliest detection time.
	pub start_time: Option<DateTime<Utc>>,
	/// Latest detection time.
	pub end_time: Option<DateTime<Utc>>,
}

impl DriftQuery {
	/// Only a limit, no filters.
	pub fn with_limit(limit: u32) -> Self {
		Self {
			limit: Some(limit),
			..Self::default()
		}
	}

	/// Query pairs for the set filters, in a fixed order.
	pub fn pairs(&self) -> Vec<(&'static str, String)> {
		Pairs::default()
			.number("limit", self.limit)
			.text("resource_type", self.resource_type.as_deref())
			.text("severity", self.severity.map(Severity::as_str))
			.text("drift_type", self.drift_type.map(DriftType::as_str))
			.text("user_identity", self.user_identity.as_deref())
			.time("start_time", self.start_time)
			.time("end_time", self.end_time)
			.0
	}
}

/// Filters for `GET /api/v1/impact`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImpactQuery {
	/// Maximum number of analyses.
	pub limit: Option<u32>,
	/// Exact severity.
	pub severity: Option<Severity>,
	/// Lower bound on blast radius.
	pub min_blast_radius: Option<u32>,
	/// Lower bound on affected resources.
	pub min_affected_resources: Option<u32>,
	/// Earliest analysis time.
	pub start_time: Option<DateTime<Utc>>,
	/// Latest analysis time.
	pub end_time: Option<DateTime<Utc>>,
}

impl ImpactQuery {
	/// Query pairs for the set filters, in a fixed order.
	pub fn pairs(&self) -> Vec<(&'static str, String)> {
		Pairs::default()
			.number("limit", self.limit)
			.text("severity", self.severity.map(Severity::as_str))
			.number("min_blast_radius", self.min_blast_radius)
			.number("min_affected_resources", self.min_affected_resources)
			.time("start_time", self.start_time)
			.time("end_time", self.end_time)
			.0
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	#[test]
	fn unset_parameters_are_omitted() {
		assert!(DriftQuery::default().pairs().is_empty());
		assert!(ImpactQuery::default().pairs().is_empty());
		assert_eq!(
			DriftQuery::with_limit(500).pairs(),
			vec![("limit", "500".to_string())]
		);
	}

	#[test]
	fn empty_strings_count_as_unset() {
		let q = DriftQuery {
			resource_type: Some(String::new()),
			user_identity: Some("ops".into()),
			..Default::default()
		};
		assert_eq!(q.pairs(), vec![("user_identity", "ops".to_string())]);
	}

	#[test]
	fn enums_and_times_use_wire_format() {
		let q = DriftQuery {
			severity: Some(Severity::Critical),
			drift_type: Some(DriftType::Deleted),
			start_time: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
			..Default::default()
		};
		assert_eq!(
			q.pairs(),
			vec![
				("severity", "critical".to_string()),
				("drift_type", "deleted".to_string()),
				("start_time", "2024-01-02T03:04:05Z".to_string()),
			]
		);
	}

	#[test]
	fn impact_filters() {
		let q = ImpactQuery {
			limit: Some(20),
			min_blast_radius: Some(3),
			..Default::default()
		};
		assert_eq!(
			q.pairs(),
			vec![
				("limit", "20".to_string()),
				("min_blast_radius", "3".to_string()),
			]
		);
	}
}
