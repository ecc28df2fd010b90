//! Display helpers shared by the dashboard views.

use chrono::{DateTime, Utc};

use crate::api::types::{DriftType, Severity};

/// `YYYY/MM/DD HH:MM` in UTC.
pub fn timestamp(t: &DateTime<Utc>) -> String {
	t.format("%Y/%m/%d %H:%M").to_string()
}

/// Badge color for a severity.
pub fn severity_color(severity: Severity) -> &'static str {
	match severity {
		Severity::Critical => "#dc2626",
		Severity::High => "#ea580c",
		Severity::Medium => "#ca8a04",
		Severity::Low => "#65a30d",
		Severity::Unknown => "#6b7280",
	}
}

/// Badge color for a drift type.
pub fn drift_type_color(drift_type: DriftType) -> &'static str {
	match drift_type {
		DriftType::Created => "#16a34a",
		DriftType::Modified => "#ca8a04",
		DriftType::Deleted => "#dc2626",
		DriftType::Unknown => "#6b7280",
	}
}

/// Colour for a stats map key, which arrives as a plain string.
pub fn key_color(key: &str) -> &'static str {
	if let Some(s) = Severity::from_key(key) {
		return severity_color(s);
	}
	DriftType::from_key(key).map_or("#3b82f6", drift_type_color)
}

/// One decimal place, as the KPI cards show averages.
pub fn average(value: f64) -> String {
	format!("{value:.1}")
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	#[test]
	fn timestamps_use_utc_minutes() {
		let t = Utc.with_ymd_and_hms(2024, 2, 9, 7, 5, 59).unwrap();
		assert_eq!(timestamp(&t), "2024/02/09 07:05");
	}

	#[test]
	fn key_colors_cover_both_enums() {
		assert_eq!(key_color("critical"), "#dc2626");
		assert_eq!(key_color("created"), "#16a34a");
		assert_eq!(key_color("ec2"), "#3b82f6");
		assert_eq!(average(2.26), "2.3");
		assert_eq!(average(0.0), "0.0");
	}
}
