//! Thirty day drift trend chart.
//!
//! Drifts are bucketed by UTC calendar day. Buckets cover the 30 days
//! ending today; drifts outside that window are ignored.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use futures::FutureExt;
use leptos::prelude::*;
use log::{debug, warn};

use super::format::{drift_type_color, severity_color};
use super::status::{ErrorNotice, Loading};
use crate::api::types::{DriftEvent, DriftType, Severity};
use crate::api::{ApiClient, DriftQuery};
use crate::polling::use_poller;

const TRENDS_POLL: Duration = Duration::from_secs(60);
const FETCH_LIMIT: u32 = 1000;
/// Days covered by the chart, today included.
pub const WINDOW_DAYS: u64 = 30;

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 240.0;
const CHART_PADDING: f64 = 24.0;

/// Drift counts for one day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DayBucket {
	/// UTC calendar day.
	pub date: NaiveDate,
	/// Every drift that day, unknown severity or type included.
	pub total: u32,
	/// Critical drifts.
	pub critical: u32,
	/// High drifts.
	pub high: u32,
	/// Medium drifts.
	pub medium: u32,
	/// Low drifts.
	pub low: u32,
	/// Created drifts.
	pub created: u32,
	/// Modified drifts.
	pub modified: u32,
	/// Deleted drifts.
	pub deleted: u32,
}

impl DayBucket {
	fn add(&mut self, drift: &DriftEvent) {
		self.total += 1;
		match drift.severity {
			Severity::Critical => self.critical += 1,
			Severity::High => self.high += 1,
			Severity::Medium => self.medium += 1,
			Severity::Low => self.low += 1,
			Severity::Unknown => {}
		}
		match drift.drift_type {
			DriftType::Created => self.created += 1,
			DriftType::Modified => self.modified += 1,
			DriftType::Deleted => self.deleted += 1,
			DriftType::Unknown => {}
		}
	}

	/// Count for one severity.
	pub fn severity(&self, severity: Severity) -> u32 {
		match severity {
			Severity::Critical => self.critical,
			Severity::High => self.high,
			Severity::Medium => self.medium,
			Severity::Low => self.low,
			Severity::Unknown => 0,
		}
	}

	/// Count for one drift type.
	pub fn drift_type(&self, drift_type: DriftType) -> u32 {
		match drift_type {
			DriftType::Created => self.created,
			DriftType::Modified => self.modified,
			DriftType::Deleted => self.deleted,
			DriftType::Unknown => 0,
		}
	}
}

/// One bucket per day, oldest first, ending at `today`.
pub fn aggregate_by_day(drifts: &[DriftEvent], today: NaiveDate) -> Vec<DayBucket> {
	let Some(first) = today.checked_sub_days(Days::new(WINDOW_DAYS - 1)) else {
		return Vec::new();
	};
	let mut buckets: Vec<DayBucket> = first
		.iter_days()
		.take(WINDOW_DAYS as usize)
		.map(|date| DayBucket {
			date,
			..DayBucket::default()
		})
		.collect();

	for drift in drifts {
		let day = drift.timestamp.date_naive();
		if day < first || day > today {
			continue;
		}
		let offset = (day - first).num_days() as usize;
		if let Some(bucket) = buckets.get_mut(offset) {
			bucket.add(drift);
		}
	}
	buckets
}

/// Which breakdown the chart shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeriesView {
	/// One line per severity.
	#[default]
	Severity,
	/// One line per drift type.
	Type,
}

/// How each series is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartKind {
	/// Stroke only.
	Line,
	/// Stroke with a translucent fill down to the baseline.
	#[default]
	Area,
}

/// A named line of the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
	/// Legend text.
	pub label: &'static str,
	/// Stroke color.
	pub color: &'static str,
	/// One value per bucket.
	pub values: Vec<u32>,
}

/// Splits buckets into the series for `view`.
pub fn series(buckets: &[DayBucket], view: SeriesView) -> Vec<Series> {
	match view {
		SeriesView::Severity => Severity::ORDERED
			.into_iter()
			.map(|s| Series {
				label: s.as_str(),
				color: severity_color(s),
				values: buckets.iter().map(|b| b.severity(s)).collect(),
			})
			.collect(),
		SeriesView::Type => DriftType::ALL
			.into_iter()
			.map(|t| Series {
				label: t.as_str(),
				color: drift_type_color(t),
				values: buckets.iter().map(|b| b.drift_type(t)).collect(),
			})
			.collect(),
	}
}

fn point(i: usize, value: u32, count: usize, max: u32) -> (f64, f64) {
	let inner_w = CHART_WIDTH - 2.0 * CHART_PADDING;
	let inner_h = CHART_HEIGHT - 2.0 * CHART_PADDING;
	let x = if count > 1 {
		CHART_PADDING + inner_w * i as f64 / (count - 1) as f64
	} else {
		CHART_WIDTH / 2.0
	};
	let y = CHART_HEIGHT - CHART_PADDING - inner_h * f64::from(value) / f64::from(max.max(1));
	(x, y)
}

/// SVG path data for `values` scaled so `max` reaches the top. Area paths
/// are closed along the baseline.
pub fn series_path(values: &[u32], max: u32, kind: ChartKind) -> String {
	let mut path = String::new();
	for (i, &v) in values.iter().enumerate() {
		let (x, y) = point(i, v, values.len(), max);
		let cmd = if i == 0 { 'M' } else { 'L' };
		path.push_str(&format!("{cmd}{x:.1},{y:.1} "));
	}
	if kind == ChartKind::Area && !values.is_empty() {
		let baseline = CHART_HEIGHT - CHART_PADDING;
		let (last_x, _) = point(values.len() - 1, 0, values.len(), max);
		let (first_x, _) = point(0, 0, values.len(), max);
		path.push_str(&format!("L{last_x:.1},{baseline:.1} L{first_x:.1},{baseline:.1} Z"));
	}
	path.trim_end().to_string()
}

/// Trend view, refreshed every minute.
#[component]
pub fn Trends() -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let buckets = RwSignal::new(None::<Vec<DayBucket>>);
	let error = RwSignal::new(None::<String>);
	let view_mode = RwSignal::new(SeriesView::default());
	let kind = RwSignal::new(ChartKind::default());

	let poller = use_poller("trends", TRENDS_POLL, move |ticket| {
		let client = client.clone();
		async move {
			let result = client.list_drifts(&DriftQuery::with_limit(FETCH_LIMIT)).await;
			if !ticket.is_current() {
				return;
			}
			match result {
				Ok(list) => {
					let today = Utc::now().date_naive();
					debug!("drift-graph: trends over {} drifts", list.drifts.len());
					buckets.set(Some(aggregate_by_day(&list.drifts, today)));
					error.set(None);
				}
				Err(e) => {
					warn!("drift-graph: failed to load trend data: {e}");
					error.set(Some(format!("Failed to load trend data: {e}")));
				}
			}
		}
		.boxed_local()
	});
	let on_retry = Callback::new(move |_| poller.poll_now());

	let toggle = move |label: &'static str, active: Signal<bool>, on: Callback<()>| {
		view! {
			<button class:active=move || active.get() on:click=move |_| on.run(())>
				{label}
			</button>
		}
	};

	view! {
		<section class="trends">
			<header class="trends-header">
				<h2>"Drift trends (30 days)"</h2>
				<div class="toggle-group">
					{toggle(
						"By severity",
						Signal::derive(move || view_mode.get() == SeriesView::Severity),
						Callback::new(move |_| view_mode.set(SeriesView::Severity)),
					)}
					{toggle(
						"By type",
						Signal::derive(move || view_mode.get() == SeriesView::Type),
						Callback::new(move |_| view_mode.set(SeriesView::Type)),
					)}
				</div>
				<div class="toggle-group">
					{toggle(
						"Area",
						Signal::derive(move || kind.get() == ChartKind::Area),
						Callback::new(move |_| kind.set(ChartKind::Area)),
					)}
					{toggle(
						"Line",
						Signal::derive(move || kind.get() == ChartKind::Line),
						Callback::new(move |_| kind.set(ChartKind::Line)),
					)}
				</div>
			</header>
			{move || {
				if let Some(message) = error.get() {
					return view! { <ErrorNotice message=message on_retry=on_retry /> }.into_any();
				}
				let Some(days) = buckets.get() else {
					return view! { <Loading text="Loading chart..." /> }.into_any();
				};
				view! { <TrendChart buckets=days series_view=view_mode.get() kind=kind.get() /> }.into_any()
			}}
		</section>
	}
}

#[component]
fn TrendChart(buckets: Vec<DayBucket>, series_view: SeriesView, kind: ChartKind) -> impl IntoView {
	let lines = series(&buckets, series_view);
	let max = lines
		.iter()
		.flat_map(|s| s.values.iter().copied())
		.max()
		.unwrap_or(0);
	let total: u32 = buckets.iter().map(|b| b.total).sum();
	let (first, last) = (
		buckets.first().map(|b| b.date.format("%-m/%-d").to_string()),
		buckets.last().map(|b| b.date.format("%-m/%-d").to_string()),
	);
	let fill_opacity = if kind == ChartKind::Area { "0.15" } else { "0" };
	let baseline = (CHART_HEIGHT - CHART_PADDING).to_string();
	let label_y = (CHART_HEIGHT - 4.0).to_string();

	let paths = lines
		.iter()
		.map(|s| {
			view! {
				<path
					d=series_path(&s.values, max, kind)
					stroke=s.color
					fill=if kind == ChartKind::Area { s.color } else { "none" }
					fill-opacity=fill_opacity
					stroke-width="2"
				/>
			}
		})
		.collect_view();
	let legend = lines
		.iter()
		.map(|s| {
			let sum: u32 = s.values.iter().sum();
			view! {
				<li>
					<span class="legend-swatch" style:background-color=s.color></span>
					{format!("{} ({sum})", s.label)}
				</li>
			}
		})
		.collect_view();

	view! {
		<svg
			class="trend-chart"
			viewBox=format!("0 0 {CHART_WIDTH} {CHART_HEIGHT}")
			preserveAspectRatio="none"
		>
			<line
				x1=CHART_PADDING.to_string()
				y1=baseline.clone()
				x2=(CHART_WIDTH - CHART_PADDING).to_string()
				y2=baseline
				stroke="#4b5563"
			/>
			{paths}
			<text x=CHART_PADDING.to_string() y=label_y.clone() class="axis-label">
				{first}
			</text>
			<text
				x=(CHART_WIDTH - CHART_PADDING).to_string()
				y=label_y
				text-anchor="end"
				class="axis-label"
			>
				{last}
			</text>
			<text x=CHART_PADDING.to_string() y=(CHART_PADDING - 8.0).to_string() class="axis-label">
				{format!("max {max}/day")}
			</text>
		</svg>
		<ul class="legend">{legend}</ul>
		<p class="trend-total">{format!("{total} drifts in the last {WINDOW_DAYS} days")}</p>
	}
}
