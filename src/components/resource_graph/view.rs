//! Resource graph tab: fetch, layout selector, canvas and details panel.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use super::component::ResourceGraphCanvas;
use super::elements::ElementSet;
use super::health::NodeView;
use super::layout::LayoutMode;
use super::panel::NodeDetailsPanel;
use crate::api::ApiClient;
use crate::components::status::{ErrorNotice, Loading};
use crate::polling::PollGuard;

/// Loads `GET /api/v1/graph` on mount and whenever Refresh is pressed.
#[component]
pub fn ResourceGraphView() -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let elements = RwSignal::new(ElementSet::default());
	let loaded = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let mode = RwSignal::new(LayoutMode::default());
	let selected = RwSignal::new(None::<NodeView>);
	let guard = PollGuard::new();

	let cleanup = guard.clone();
	on_cleanup(move || cleanup.cancel());

	let load = Arc::new(move || {
		let Some(ticket) = guard.try_begin() else {
			return;
		};
		let client = client.clone();
		spawn_local(async move {
			let result = client.graph().await;
			if !ticket.is_current() {
				return;
			}
			match result {
				Ok(graph) => {
					let set = ElementSet::from_graph(&graph);
					info!(
						"drift-graph: graph loaded, {} nodes and {} edges ({} from api)",
						set.nodes().len(),
						set.edges().len(),
						graph.edges.len()
					);
					elements.set(set);
					error.set(None);
				}
				Err(e) => {
					warn!("drift-graph: failed to load resource graph: {e}");
					error.set(Some(format!("Failed to load resource graph: {e}")));
				}
			}
			loaded.set(true);
		});
	});
	load();

	let refresh = load.clone();
	let on_retry = Callback::new(move |_| load());

	view! {
		<section class="resource-graph">
			<div class="graph-toolbar">
				<label>
					"Layout "
					<select on:change=move |ev| {
						if let Some(next) = LayoutMode::from_key(&event_target_value(&ev)) {
							mode.set(next);
						}
					}>
						{LayoutMode::ALL
							.into_iter()
							.map(|m| {
								view! {
									<option value=m.key() selected=move || mode.get() == m>
										{m.label()}
									</option>
								}
							})
							.collect_view()}
					</select>
				</label>
				<button on:click=move |_| refresh()>"Refresh"</button>
				<span class="graph-counts">
					{move || {
						elements
							.with(|e| format!("{} resources, {} relationships", e.nodes().len(), e.edges().len()))
					}}
				</span>
			</div>
			{move || {
				error.get().map(|message| view! { <ErrorNotice message=message on_retry=on_retry /> })
			}}
			<Show when=move || loaded.get() fallback=|| view! { <Loading text="Loading resource graph..." /> }>
				<Show
					when=move || !elements.with(ElementSet::is_empty)
					fallback=|| view! { <p class="empty">"No resources in the graph."</p> }
				>
					<div class="graph-stage">
						<ResourceGraphCanvas elements=elements mode=mode selected=selected />
						<NodeDetailsPanel selected=selected />
					</div>
				</Show>
			</Show>
		</section>
	}
}
