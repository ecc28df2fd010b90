//! Client-side search, sort and pagination for the drift table.

use std::cmp::Ordering;

use crate::api::types::DriftEvent;

/// Rows per page.
pub const PAGE_SIZE: usize = 20;

/// Sortable column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
	/// Detection time.
	#[default]
	Timestamp,
	/// Severity rank.
	Severity,
	/// Resource type, alphabetical.
	ResourceType,
	/// Drift type, alphabetical.
	Type,
}

impl SortField {
	/// Columns in header order.
	pub const ALL: [SortField; 4] = [
		SortField::Timestamp,
		SortField::Severity,
		SortField::ResourceType,
		SortField::Type,
	];

	/// Column header.
	pub fn label(self) -> &'static str {
		match self {
			Self::Timestamp => "Time",
			Self::Severity => "Severity",
			Self::ResourceType => "Resource type",
			Self::Type => "Drift",
		}
	}

	fn compare(self, a: &DriftEvent, b: &DriftEvent) -> Ordering {
		match self {
			Self::Timestamp => a.timestamp.cmp(&b.timestamp),
			Self::Severity => a.severity.rank().cmp(&b.severity.rank()),
			Self::ResourceType => a.resource_type.cmp(&b.resource_type),
			Self::Type => a.drift_type.as_str().cmp(b.drift_type.as_str()),
		}
	}
}

/// Sort order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
	/// Smallest first.
	Asc,
	/// Largest first.
	#[default]
	Desc,
}

impl SortDirection {
	/// The opposite direction.
	pub fn flipped(self) -> Self {
		match self {
			Self::Asc => Self::Desc,
			Self::Desc => Self::Asc,
		}
	}

	/// Header indicator glyph.
	pub fn arrow(self) -> &'static str {
		match self {
			Self::Asc => "\u{25b2}",
			Self::Desc => "\u{25bc}",
		}
	}
}

/// Search text, sort order and the requested page (zero based).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableQuery {
	/// Case-insensitive text matched against id, type and user.
	pub search: String,
	/// Sort column.
	pub sort: SortField,
	/// Sort order.
	pub direction: SortDirection,
	/// Requested page.
	pub page: usize,
}

/// One page of rows after filtering and sorting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TablePage {
	/// Rows on this page.
	pub rows: Vec<DriftEvent>,
	/// Page actually shown, after clamping.
	pub page: usize,
	/// At least one.
	pub total_pages: usize,
	/// Rows matching the search, across all pages.
	pub matched: usize,
}

impl TableQuery {
	/// Clicking the active column flips direction, a new column starts
	/// descending.
	pub fn toggle_sort(&mut self, field: SortField) {
		if self.sort == field {
			self.direction = self.direction.flipped();
		} else {
			self.sort = field;
			self.direction = SortDirection::Desc;
		}
	}

	/// Case-insensitive match on resource id, resource type and the root
	/// cause user identity.
	pub fn matches(&self, drift: &DriftEvent) -> bool {
		let needle = self.search.trim().to_lowercase();
		if needle.is_empty() {
			return true;
		}
		[
			Some(drift.resource_id.as_str()),
			Some(drift.resource_type.as_str()),
			drift.user_identity(),
		]
		.into_iter()
		.flatten()
		.any(|field| field.to_lowercase().contains(&needle))
	}

	/// Filters, stably sorts and slices `drifts`.
	pub fn apply(&self, drifts: &[DriftEvent]) -> TablePage {
		let mut rows: Vec<&DriftEvent> = drifts.iter().filter(|d| self.matches(d)).collect();
		rows.sort_by(|a, b| {
			let ord = self.sort.compare(a, b);
			match self.direction {
				SortDirection::Asc => ord,
				SortDirection::Desc => ord.reverse(),
			}
		});

		let matched = rows.len();
		let total_pages = matched.div_ceil(PAGE_SIZE);
		let page = self.page.min(total_pages.saturating_sub(1));
		let rows = rows
			.into_iter()
			.skip(page * PAGE_SIZE)
			.take(PAGE_SIZE)
			.cloned()
			.collect();

		TablePage {
			rows,
			page,
			total_pages,
			matched,
		}
	}
}

#[cfg(test)]
mod tests {
	use chrono::{Duration, TimeZone, Utc};

	use super::*;
	use crate::api::types::{DriftType, RootCause, Severity};

	fn drift(id: &str, severity: Severity, minutes: i64) -> DriftEvent {
		DriftEvent {
			id: id.to_string(),
			resource_id: format!("aws:ec2:{id}"),
			resource_type: "ec2".to_string(),
			drift_type: DriftType::Modified,
			severity,
			timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
			root_cause: None,
			diff: None,
		}
	}

	fn ids(page: &TablePage) -> Vec<&str> {
		page.rows.iter().map(|d| d.id.as_str()).collect()
	}

	#[test]
	fn severity_descending_for_every_rotation() {
		let base = vec![
			drift("l", Severity::Low, 0),
			drift("c", Severity::Critical, 1),
			drift("m", Severity::Medium, 2),
			drift("h", Severity::High, 3),
		];
		let query = TableQuery {
			sort: SortField::Severity,
			..Default::default()
		};
		for shift in 0..base.len() {
			let mut input = base.clone();
			input.rotate_left(shift);
			assert_eq!(ids(&query.apply(&input)), vec!["c", "h", "m", "l"]);
		}
	}

	#[test]
	fn equal_keys_keep_input_order() {
		let input = vec![
			drift("a", Severity::High, 0),
			drift("b", Severity::Low, 1),
			drift("c", Severity::High, 2),
			drift("d", Severity::High, 3),
		];
		let mut query = TableQuery {
			sort: SortField::Severity,
			..Default::default()
		};
		assert_eq!(ids(&query.apply(&input)), vec!["a", "c", "d", "b"]);
		query.direction = SortDirection::Asc;
		assert_eq!(ids(&query.apply(&input)), vec!["b", "a", "c", "d"]);
	}

	#[test]
	fn default_order_is_newest_first() {
		let input = vec![drift("old", Severity::Low, 0), drift("new", Severity::Low, 10)];
		assert_eq!(ids(&TableQuery::default().apply(&input)), vec!["new", "old"]);
	}

	#[test]
	fn toggle_sort_flips_or_switches() {
		let mut query = TableQuery::default();
		query.toggle_sort(SortField::Timestamp);
		assert_eq!(query.direction, SortDirection::Asc);
		query.toggle_sort(SortField::ResourceType);
		assert_eq!(query.sort, SortField::ResourceType);
		assert_eq!(query.direction, SortDirection::Desc);
	}

	#[test]
	fn search_covers_id_type_and_user() {
		let mut with_user = drift("x", Severity::Low, 0);
		with_user.root_cause = Some(RootCause {
			user_identity: "Alice@Example.com".into(),
			..Default::default()
		});
		let input = vec![with_user, drift("y", Severity::Low, 1)];

		let by = |search: &str| {
			TableQuery {
				search: search.into(),
				..Default::default()
			}
			.apply(&input)
			.matched
		};
		assert_eq!(by("alice"), 1);
		assert_eq!(by("EC2"), 2);
		assert_eq!(by("aws:ec2:y"), 1);
		assert_eq!(by("nobody"), 0);
		assert_eq!(by("  "), 2);
	}

	#[test]
	fn pages_are_clamped_to_the_filtered_set() {
		let input: Vec<DriftEvent> = (0..45)
			.map(|i| drift(&format!("d{i}"), Severity::Low, i))
			.collect();
		let mut query = TableQuery {
			page: 9,
			..Default::default()
		};
		let page = query.apply(&input);
		assert_eq!(page.total_pages, 3);
		assert_eq!(page.page, 2);
		assert_eq!(page.rows.len(), 5);

		query.search = "d44".into();
		let page = query.apply(&input);
		assert_eq!((page.page, page.total_pages, page.rows.len()), (0, 1, 1));

		query.search = "none".into();
		let page = query.apply(&input);
		assert_eq!((page.page, page.total_pages), (0, 0));
		assert!(page.rows.is_empty());
	}
}
