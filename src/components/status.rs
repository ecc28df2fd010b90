//! Loading, error and connection indicators.

use std::time::Duration;

use futures::FutureExt;
use leptos::prelude::*;
use log::{debug, warn};

use crate::api::ApiClient;
use crate::polling::use_poller;

const HEALTH_POLL: Duration = Duration::from_secs(30);

/// Inline failure message with a retry action.
#[component]
pub fn ErrorNotice(#[prop(into)] message: Signal<String>, on_retry: Callback<()>) -> impl IntoView {
	view! {
		<div class="error-notice" role="alert">
			<span class="error-message">{message}</span>
			<button class="retry" on:click=move |_| on_retry.run(())>
				"Retry"
			</button>
		</div>
	}
}

/// Placeholder shown before the first response.
#[component]
pub fn Loading(#[prop(default = "Loading...")] text: &'static str) -> impl IntoView {
	view! { <div class="loading">{text}</div> }
}

/// Header badge reflecting whether `GET /health` succeeds.
#[component]
pub fn ConnectionIndicator() -> impl IntoView {
	let client = use_context::<ApiClient>().unwrap_or_default();
	let connected = RwSignal::new(None::<bool>);

	use_poller("health", HEALTH_POLL, move |ticket| {
		let client = client.clone();
		async move {
			let ok = match client.health().await {
				Ok(status) => {
					debug!("drift-graph: backend status {:?}", status.status);
					true
				}
				Err(e) => {
					warn!("drift-graph: health check failed: {e}");
					false
				}
			};
			if ticket.is_current() {
				connected.set(Some(ok));
			}
		}
		.boxed_local()
	});

	let (class, label) = (
		move || match connected.get() {
			Some(true) => "connection connected",
			Some(false) => "connection disconnected",
			None => "connection pending",
		},
		move || match connected.get() {
			Some(true) => "Connected",
			Some(false) => "Disconnected",
			None => "Connecting...",
		},
	);

	view! {
		<div class=class>
			<span class="connection-dot"></span>
			<span class="connection-label">{label}</span>
		</div>
	}
}
