//! Overview dashboard: KPI cards, breakdown charts and recent activity.

use std::time::Duration;

use futures::FutureExt;
use leptos::prelude::*;
use log::{debug, warn};

use super::charts::BarChart;
use super::format::{average, drift_type_color, severity_color, timestamp};
use super::status::{ErrorNotice, Loading};
use crate::api::types::{DriftEvent, DriftStats, HighImpactDrift, ImpactStats, Severity};
use crate::api::{ApiClient, DriftQuery};
use crate::polling::use_poller;

const OVERVIEW_POLL: Duration = Duration::from_secs(30);
const STATS_DAYS: u32 = 7;
const RECENT_LIMIT: u32 = 10;
const HIGH_IMPACT_LIMIT: u32 = 10;
const TOP_RESOURCE_TYPES: usize = 8;

/// Everything the overview shows, replaced as one unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverviewData {
	/// Drift counts over the stats window.
	pub drift_stats: DriftStats,
	/// Impact figures over the stats window.
	pub impact_stats: ImpactStats,
	/// Latest drifts.
	pub recent: Vec<DriftEvent>,
	/// Most impactful drifts.
	pub high_impact: Vec<HighImpactDrift>,
}

impl OverviewData {
	/// Critical drifts in the stats window.
	pub fn critical_count(&self) -> u64 {
		self.drift_stats
			.by_severity
			.get(Severity::Critical.as_str())
			.copied()
			.unwrap_or(0)
	}
}

async fn fetch_overview(client: &ApiClient) -> Result<OverviewData, crate::api::ApiError> {
	let recent_query = DriftQuery::with_limit(RECENT_LIMIT);
	let (drift_stats, impact_stats, recent, high) = futures::try_join!(
		client.drift_stats(STATS_DAYS),
		client.impact_stats(STATS_DAYS),
		client.list_drifts(&recent_query),
		client.high_impact(STATS_DAYS, HIGH_IMPACT_LIMIT),
	)?;
	Ok(OverviewData {
		drift_stats,
		impact_stats,
		recent: recent.drifts,
		high_impact: high.drifts,
	})
}

/// Landing view, refreshed every 30 seconds.
#[component]
pub fn Overview() -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let data = RwSignal::new(None::<OverviewData>);
	let error = RwSignal::new(None::<String>);

	let poller = use_poller("overview", OVERVIEW_POLL, move |ticket| {
		let client = client.clone();
		async move {
			let result = fetch_overview(&client).await;
			if !ticket.is_current() {
				return;
			}
			match result {
				Ok(next) => {
					debug!(
						"drift-graph: overview loaded, {} drifts in {STATS_DAYS} days",
						next.drift_stats.total_count
					);
					data.set(Some(next));
					error.set(None);
				}
				Err(e) => {
					warn!("drift-graph: failed to load overview: {e}");
					error.set(Some(format!("Failed to load dashboard data: {e}")));
				}
			}
		}
		.boxed_local()
	});
	let on_retry = Callback::new(move |_| poller.poll_now());

	view! {
		<section class="overview">
			{move || {
				if let Some(message) = error.get() {
					return view! { <ErrorNotice message=message on_retry=on_retry /> }.into_any();
				}
				match data.get() {
					None => view! { <Loading text="Loading dashboard..." /> }.into_any(),
					Some(d) => view! { <OverviewBody data=d /> }.into_any(),
				}
			}}
		</section>
	}
}

#[component]
fn OverviewBody(data: OverviewData) -> impl IntoView {
	let kpis = [
		("Total drifts (7d)", data.drift_stats.total_count.to_string(), "kpi"),
		("Critical", data.critical_count().to_string(), "kpi kpi-critical"),
		("Avg blast radius", average(data.impact_stats.avg_blast_radius), "kpi"),
		(
			"Avg affected resources",
			average(data.impact_stats.avg_affected_resources),
			"kpi",
		),
	];

	view! {
		<div class="kpi-row">
			{kpis
				.into_iter()
				.map(|(label, value, class)| {
					view! {
						<div class=class>
							<span class="kpi-label">{label}</span>
							<span class="kpi-value">{value}</span>
						</div>
					}
				})
				.collect_view()}
		</div>
		<div class="chart-row">
			<BarChart title="By severity" counts=data.drift_stats.by_severity.clone() />
			<BarChart title="By type" counts=data.drift_stats.by_type.clone() />
			<BarChart
				title="Top resource types"
				counts=data.drift_stats.by_resource_type.clone()
				limit=TOP_RESOURCE_TYPES
			/>
		</div>
		<div class="activity-row">
			<RecentDrifts drifts=data.recent />
			<HighImpact drifts=data.high_impact />
		</div>
	}
}

#[component]
fn RecentDrifts(drifts: Vec<DriftEvent>) -> impl IntoView {
	let empty = drifts.is_empty();
	let rows = drifts
		.into_iter()
		.map(|d| {
			let user = d.user_identity().unwrap_or("-").to_string();
			view! {
				<tr>
					<td>{timestamp(&d.timestamp)}</td>
					<td class="mono">{d.resource_id}</td>
					<td>{d.resource_type}</td>
					<td style:color=drift_type_color(d.drift_type)>{d.drift_type.as_str()}</td>
					<td style:color=severity_color(d.severity)>{d.severity.as_str()}</td>
					<td>{user}</td>
				</tr>
			}
		})
		.collect_view();

	view! {
		<section class="recent-drifts">
			<h3>"Recent drifts"</h3>
			<table>
				<thead>
					<tr>
						<th>"Time"</th>
						<th>"Resource"</th>
						<th>"Type"</th>
						<th>"Drift"</th>
						<th>"Severity"</th>
						<th>"User"</th>
					</tr>
				</thead>
				<tbody>
					<Show when=move || empty>
						<tr>
							<td colspan="6" class="empty">"No drifts detected"</td>
						</tr>
					</Show>
					{rows}
				</tbody>
			</table>
		</section>
	}
}

#[component]
fn HighImpact(drifts: Vec<HighImpactDrift>) -> impl IntoView {
	let empty = drifts.is_empty();
	let rows = drifts
		.into_iter()
		.map(|d| {
			view! {
				<tr>
					<td class="mono">{d.resource_id}</td>
					<td>{d.resource_type}</td>
					<td>{d.affected_resource_count}</td>
					<td>{d.blast_radius}</td>
					<td style:color=severity_color(d.severity)>{d.severity.as_str()}</td>
				</tr>
			}
		})
		.collect_view();

	view! {
		<section class="high-impact">
			<h3>"High impact drifts"</h3>
			<table>
				<thead>
					<tr>
						<th>"Resource"</th>
						<th>"Type"</th>
						<th>"Affected"</th>
						<th>"Blast radius"</th>
						<th>"Severity"</th>
					</tr>
				</thead>
				<tbody>
					<Show when=move || empty>
						<tr>
							<td colspan="5" class="empty">"No high impact drifts"</td>
						</tr>
					</Show>
					{rows}
				</tbody>
			</table>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_stats_render_as_zero() {
		let data = OverviewData::default();
		assert_eq!(data.critical_count(), 0);
		assert_eq!(average(data.impact_stats.avg_blast_radius), "0.0");
	}

	#[test]
	fn critical_count_reads_the_severity_map() {
		let mut data = OverviewData::default();
		data.drift_stats
			.by_severity
			.insert("critical".to_string(), 3);
		data.drift_stats.by_severity.insert("high".to_string(), 9);
		assert_eq!(data.critical_count(), 3);
	}
}
