//! Filterable, sortable and paginated drift event table.
//!
//! Severity, drift type and resource type filters are sent to the server.
//! Free-text search, sorting and paging run on the loaded rows via
//! [`TableQuery`]. Clicking a row opens the drift detail panel.

pub mod query;

use std::time::Duration;

use futures::FutureExt;
use leptos::prelude::*;
use log::{info, warn};

pub use query::{SortField, TablePage, TableQuery};

use super::drift_detail::DriftDetail;
use super::format::{drift_type_color, severity_color, timestamp};
use super::status::{ErrorNotice, Loading};
use crate::api::types::{DriftEvent, DriftType, Severity};
use crate::api::{ApiClient, DriftQuery};
use crate::polling::use_poller;

const TABLE_POLL: Duration = Duration::from_secs(30);
const FETCH_LIMIT: u32 = 500;

/// Server-side filters. Empty fields are not sent.
#[derive(Clone, Debug, Default, PartialEq)]
struct ServerFilters {
	severity: Option<Severity>,
	drift_type: Option<DriftType>,
	resource_type: String,
}

impl ServerFilters {
	fn to_query(&self) -> DriftQuery {
		DriftQuery {
			severity: self.severity,
			drift_type: self.drift_type,
			resource_type: Some(self.resource_type.trim().to_string()),
			..DriftQuery::with_limit(FETCH_LIMIT)
		}
	}
}

/// Drift event table, refreshed every 30 seconds and on filter change.
#[component]
pub fn DriftTable() -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let filters = RwSignal::new(ServerFilters::default());
	let drifts = RwSignal::new(Vec::<DriftEvent>::new());
	let loaded = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let table = RwSignal::new(TableQuery::default());
	let selected = RwSignal::new(None::<String>);

	let poller = use_poller("drift table", TABLE_POLL, move |ticket| {
		let client = client.clone();
		async move {
			// Refetch until the response matches the filters still in place.
			loop {
				let sent = filters.get_untracked();
				let result = client.list_drifts(&sent.to_query()).await;
				if !ticket.is_current() {
					return;
				}
				if filters.get_untracked() != sent {
					continue;
				}
				match result {
					Ok(list) => {
						info!("drift-graph: loaded {} drifts", list.drifts.len());
						drifts.set(list.drifts);
						error.set(None);
					}
					Err(e) => {
						warn!("drift-graph: failed to load drifts: {e}");
						error.set(Some(format!("Failed to load drift events: {e}")));
					}
				}
				loaded.set(true);
				return;
			}
		}
		.boxed_local()
	});

	let refetch = poller.clone();
	Effect::new(move |prev: Option<()>| {
		filters.track();
		if prev.is_some() {
			refetch.poll_now();
		}
	});

	let page = Memo::new(move |_| drifts.with(|rows| table.with(|q| q.apply(rows))));

	let retry = poller.clone();
	let on_retry = Callback::new(move |_| retry.poll_now());

	let sort_header = move |field: SortField| {
		let indicator = move || {
			let q = table.get();
			if q.sort == field { q.direction.arrow() } else { "" }
		};
		view! {
			<th class="sortable" on:click=move |_| table.update(|q| q.toggle_sort(field))>
				{field.label()}
				" "
				{indicator}
			</th>
		}
	};

	view! {
		<div class="drift-table">
			<div class="table-filters">
				<input
					type="search"
					placeholder="Search by resource ID, type, or user..."
					prop:value=move || table.with(|q| q.search.clone())
					on:input=move |ev| {
						let text = event_target_value(&ev);
						table.update(|q| {
							q.search = text;
							q.page = 0;
						});
					}
				/>
				<select on:change=move |ev| {
					let value = event_target_value(&ev);
					filters.update(|f| f.severity = Severity::from_key(&value));
				}>
					<option value="">"All severities"</option>
					{Severity::ORDERED
						.into_iter()
						.map(|s| view! { <option value=s.as_str()>{s.as_str()}</option> })
						.collect_view()}
				</select>
				<select on:change=move |ev| {
					let value = event_target_value(&ev);
					filters.update(|f| f.drift_type = DriftType::from_key(&value));
				}>
					<option value="">"All types"</option>
					{DriftType::ALL
						.into_iter()
						.map(|t| view! { <option value=t.as_str()>{t.as_str()}</option> })
						.collect_view()}
				</select>
				<input
					type="text"
					placeholder="Filter by resource type..."
					on:change=move |ev| {
						let value = event_target_value(&ev);
						filters.update(|f| f.resource_type = value);
					}
				/>
				<span class="match-count">
					{move || {
						let n = page.with(|p| p.matched);
						format!("{n} drift{} found", if n == 1 { "" } else { "s" })
					}}
				</span>
			</div>

			{move || {
				selected
					.get()
					.map(|id| {
						view! { <DriftDetail id=id on_close=Callback::new(move |_| selected.set(None)) /> }
					})
			}}

			{move || {
				if let Some(message) = error.get() {
					return view! { <ErrorNotice message=message on_retry=on_retry /> }.into_any();
				}
				if !loaded.get() {
					return view! { <Loading text="Loading drifts..." /> }.into_any();
				}
				if page.with(|p| p.rows.is_empty()) {
					return view! {
						<p class="empty">"No drifts found. Try adjusting your filters or search query."</p>
					}
						.into_any();
				}
				view! {
					<table>
						<thead>
							<tr>
								{sort_header(SortField::Timestamp)}
								{sort_header(SortField::Severity)}
								{sort_header(SortField::Type)}
								{sort_header(SortField::ResourceType)}
								<th>"Resource ID"</th>
								<th>"User"</th>
								<th>"Event"</th>
							</tr>
						</thead>
						<tbody>
							<For each=move || page.get().rows key=|d| d.id.clone() let:drift>
								<DriftRow drift=drift on_select=Callback::new(move |id| selected.set(Some(id))) />
							</For>
						</tbody>
					</table>
					<Pager page=page table=table />
				}
					.into_any()
			}}
		</div>
	}
}

#[component]
fn DriftRow(drift: DriftEvent, on_select: Callback<String>) -> impl IntoView {
	let id = drift.id.clone();
	let (user, event) = drift
		.root_cause
		.as_ref()
		.map(|rc| (rc.user_identity.clone(), rc.event_name.clone()))
		.unwrap_or_default();

	view! {
		<tr class="clickable" on:click=move |_| on_select.run(id.clone())>
			<td>{timestamp(&drift.timestamp)}</td>
			<td>
				<span class="badge" style:color=severity_color(drift.severity)>
					{drift.severity.as_str().to_uppercase()}
				</span>
			</td>
			<td>
				<span class="badge" style:color=drift_type_color(drift.drift_type)>
					{drift.drift_type.as_str()}
				</span>
			</td>
			<td>{drift.resource_type.clone()}</td>
			<td class="mono">{drift.resource_id.clone()}</td>
			<td>{if user.is_empty() { "-".to_string() } else { user }}</td>
			<td>{if event.is_empty() { "-".to_string() } else { event }}</td>
		</tr>
	}
}

#[component]
fn Pager(page: Memo<TablePage>, table: RwSignal<TableQuery>) -> impl IntoView {
	let current = move || page.with(|p| p.page);
	let total = move || page.with(|p| p.total_pages);

	view! {
		<div class="pager">
			<button
				disabled=move || current() == 0
				on:click=move |_| table.update(|q| q.page = current().saturating_sub(1))
			>
				"Previous"
			</button>
			<span>{move || format!("Page {} of {}", current() + 1, total().max(1))}</span>
			<button
				disabled=move || current() + 1 >= total()
				on:click=move |_| table.update(|q| q.page = current() + 1)
			>
				"Next"
			</button>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filters_become_query_parameters() {
		let filters = ServerFilters {
			severity: Some(Severity::High),
			drift_type: None,
			resource_type: " rds ".into(),
		};
		assert_eq!(
			filters.to_query().pairs(),
			vec![
				("limit", "500".to_string()),
				("resource_type", "rds".to_string()),
				("severity", "high".to_string()),
			]
		);
		assert_eq!(
			ServerFilters::default().to_query().pairs(),
			vec![("limit", "500".to_string())]
		);
	}
}
