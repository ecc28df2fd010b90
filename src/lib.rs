//! drift-graph: browser dashboard for infrastructure drift detection.
//!
//! This crate provides a WASM dashboard over the drift detection REST API:
//! summary statistics, a searchable drift table, thirty day trends and an
//! interactive resource dependency graph with layered, force-directed and
//! geometric layouts.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod api;
pub mod components;
pub mod config;
pub mod polling;

pub use api::{ApiClient, ApiError};
pub use components::resource_graph::{ElementSet, LayoutMode, ResourceGraphCanvas};
pub use config::DashboardConfig;

use components::drift_table::DriftTable;
use components::overview::Overview;
use components::resource_graph::ResourceGraphView;
use components::status::ConnectionIndicator;
use components::trends::Trends;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("drift-graph: logging initialized");
}

/// Top-level dashboard tabs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
	/// KPIs, breakdowns and recent activity.
	#[default]
	Overview,
	/// The drift event table.
	Drifts,
	/// Thirty day trend chart.
	Trends,
	/// Resource dependency graph.
	Graph,
}

impl Tab {
	/// Tabs in display order.
	pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Drifts, Tab::Trends, Tab::Graph];

	/// Tab caption.
	pub fn label(self) -> &'static str {
		match self {
			Self::Overview => "Overview",
			Self::Drifts => "Drifts",
			Self::Trends => "Trends",
			Self::Graph => "Resource Graph",
		}
	}
}

/// Main application component.
/// Reads the dashboard config from the DOM and provides the API client to
/// every view.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = DashboardConfig::load();
	provide_context(ApiClient::new(&config.base_url));

	let tab = RwSignal::new(Tab::default());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Drift Detection Dashboard" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="dashboard">
			<header class="dashboard-header">
				<div class="brand">
					<h1>"Drift Detection"</h1>
					<p class="subtitle">"Terraform drift detection and impact analysis"</p>
				</div>
				<nav class="tabs">
					{Tab::ALL
						.into_iter()
						.map(|t| {
							view! {
								<button class="tab" class:active=move || tab.get() == t on:click=move |_| tab.set(t)>
									{t.label()}
								</button>
							}
						})
						.collect_view()}
				</nav>
				<ConnectionIndicator />
			</header>
			<main class="dashboard-body">
				{move || match tab.get() {
					Tab::Overview => view! { <Overview /> }.into_any(),
					Tab::Drifts => view! { <DriftTable /> }.into_any(),
					Tab::Trends => view! { <Trends /> }.into_any(),
					Tab::Graph => view! { <ResourceGraphView /> }.into_any(),
				}}
			</main>
		</div>
	}
}
