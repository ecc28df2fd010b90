//! Detail panel for one drift event and its impact analysis.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};

use super::format::{severity_color, timestamp};
use super::status::{ErrorNotice, Loading};
use crate::api::types::{DriftEvent, ImpactAnalysisResult};
use crate::api::{ApiClient, ApiError};
use crate::polling::PollGuard;

/// Outcome of the impact lookup.
#[derive(Clone, Debug, PartialEq)]
enum Impact {
	/// The backend has not analyzed this drift.
	Missing,
	Failed(String),
	Ready(ImpactAnalysisResult),
}

impl From<Result<ImpactAnalysisResult, ApiError>> for Impact {
	fn from(result: Result<ImpactAnalysisResult, ApiError>) -> Self {
		match result {
			Ok(r) => Self::Ready(r),
			Err(e) if e.is_not_found() => Self::Missing,
			Err(e) => Self::Failed(e.to_string()),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
enum DetailState {
	Loading,
	Failed(String),
	Loaded(Box<DriftEvent>, Impact),
}

/// Fetches `GET /api/v1/drifts/{id}` and `GET /api/v1/impact/{id}`
/// together and renders both.
#[component]
pub fn DriftDetail(id: String, on_close: Callback<()>) -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let state = RwSignal::new(DetailState::Loading);
	let guard = PollGuard::new();

	let cleanup = guard.clone();
	on_cleanup(move || cleanup.cancel());

	let load = Arc::new(move || {
		let Some(ticket) = guard.try_begin() else {
			return;
		};
		let (client, id) = (client.clone(), id.clone());
		state.set(DetailState::Loading);
		spawn_local(async move {
			let (drift, impact) = futures::join!(client.get_drift(&id), client.get_impact(&id));
			if !ticket.is_current() {
				return;
			}
			let next = match drift {
				Ok(drift) => {
					let impact = Impact::from(impact);
					if let Impact::Failed(e) = &impact {
						warn!("drift-graph: impact lookup for {id} failed: {e}");
					}
					debug!("drift-graph: loaded drift {id}");
					DetailState::Loaded(Box::new(drift), impact)
				}
				Err(e) => {
					warn!("drift-graph: failed to load drift {id}: {e}");
					DetailState::Failed(format!("Failed to load drift event: {e}"))
				}
			};
			state.set(next);
		});
	});
	load();

	let on_retry = Callback::new(move |_| load());

	view! {
		<aside class="drift-detail">
			<header>
				<h2>"Drift details"</h2>
				<button class="close" on:click=move |_| on_close.run(())>
					"\u{00d7}"
				</button>
			</header>
			{move || match state.get() {
				DetailState::Loading => view! { <Loading /> }.into_any(),
				DetailState::Failed(message) => {
					view! { <ErrorNotice message=message on_retry=on_retry /> }.into_any()
				}
				DetailState::Loaded(drift, impact) => {
					view! {
						<EventSummary drift=*drift />
						<ImpactSummary impact=impact />
					}
						.into_any()
				}
			}}
		</aside>
	}
}

#[component]
fn EventSummary(drift: DriftEvent) -> impl IntoView {
	let root_cause = drift.root_cause.clone().map(|rc| {
		view! {
			<h3>"Root cause"</h3>
			<dl>
				<dt>"User"</dt>
				<dd>{rc.user_identity}</dd>
				<dt>"Event"</dt>
				<dd>{rc.event_name}</dd>
				<dt>"Source IP"</dt>
				<dd>{rc.source_ip}</dd>
			</dl>
		}
	});
	let diff = drift
		.diff
		.as_ref()
		.and_then(|d| serde_json::to_string_pretty(d).ok())
		.map(|text| view! { <h3>"Diff"</h3> <pre class="diff">{text}</pre> });

	view! {
		<dl>
			<dt>"Resource"</dt>
			<dd class="mono">{drift.resource_id.clone()}</dd>
			<dt>"Type"</dt>
			<dd>{drift.resource_type.clone()}</dd>
			<dt>"Drift"</dt>
			<dd>{drift.drift_type.as_str()}</dd>
			<dt>"Severity"</dt>
			<dd style:color=severity_color(drift.severity)>{drift.severity.as_str()}</dd>
			<dt>"Detected"</dt>
			<dd>{timestamp(&drift.timestamp)}</dd>
		</dl>
		{root_cause}
		{diff}
	}
}

#[component]
fn ImpactSummary(impact: Impact) -> impl IntoView {
	match impact {
		Impact::Missing => view! { <p class="empty">"No impact analysis for this drift."</p> }.into_any(),
		Impact::Failed(e) => view! { <p class="error-message">{format!("Impact analysis unavailable: {e}")}</p> }.into_any(),
		Impact::Ready(result) => {
			let recommendations = result
				.recommendations
				.into_iter()
				.map(|r| view! { <li>{r}</li> })
				.collect_view();
			let affected = result
				.affected_resources
				.into_iter()
				.map(|a| {
					view! {
						<tr>
							<td class="mono">{a.resource_id}</td>
							<td>{a.resource_type}</td>
							<td>{a.relation_type}</td>
							<td>{a.distance}</td>
							<td>{a.impact_description}</td>
						</tr>
					}
				})
				.collect_view();
			view! {
				<h3>"Impact"</h3>
				<div class="kpi-row">
					<div class="kpi">
						<span class="kpi-label">"Blast radius"</span>
						<span class="kpi-value">{result.blast_radius}</span>
					</div>
					<div class="kpi">
						<span class="kpi-label">"Affected resources"</span>
						<span class="kpi-value">{result.affected_resource_count}</span>
					</div>
				</div>
				<h3>"Recommendations"</h3>
				<ul class="recommendations">{recommendations}</ul>
				<table class="affected">
					<thead>
						<tr>
							<th>"Resource"</th>
							<th>"Type"</th>
							<th>"Relation"</th>
							<th>"Distance"</th>
							<th>"Impact"</th>
						</tr>
					</thead>
					<tbody>{affected}</tbody>
				</table>
			}
				.into_any()
		}
	}
}
