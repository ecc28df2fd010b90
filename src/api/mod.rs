//! HTTP client for the drift detection backend.
//!
//! Requests go through the browser `fetch` API. Bodies are read as text and
//! decoded with `serde_json`, so wire types stay plain serde structs.

/// Query parameter builders.
pub mod query;
/// Response bodies.
pub mod types;

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{Either, select};
use js_sys::Promise;
use log::warn;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, Request, RequestInit, RequestMode, Response, Window};

use crate::components::resource_graph::types::ResourceGraph;

pub use query::{DriftQuery, ImpactQuery};
use types::{
	DriftEvent, DriftList, DriftStats, DriftStatsResponse, HealthStatus, HighImpactList,
	ImpactAnalysisResult, ImpactList, ImpactStats, ImpactStatsResponse,
};

/// Backend used when no configuration is embedded in the page.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Upper bound for one request, body included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TIMED_OUT: &str = "timed out";

/// Transport-level failures. The backend's own error bodies are not parsed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
	/// The request could not be built (bad base URL, no `window`).
	#[error("could not build request: {0}")]
	Request(String),
	/// Fetch rejected, body unreadable, or [`REQUEST_TIMEOUT`] elapsed.
	#[error("network error: {0}")]
	Network(String),
	/// Non-2xx status.
	#[error("server responded with HTTP {0}")]
	Status(u16),
	/// Body was not the expected JSON shape.
	#[error("unexpected response body: {0}")]
	Decode(String),
}

impl ApiError {
	/// HTTP 404, used by views that treat a missing record as empty.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Status(404))
	}

	/// The request was abandoned after [`REQUEST_TIMEOUT`].
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Network(reason) if reason == TIMED_OUT)
	}
}

fn js_message(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Parses a response body.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
	serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Runs `request` until `deadline` fires. A request that is ready no later
/// than the deadline wins.
pub async fn race_timeout<T, F, D>(request: F, deadline: D) -> Result<T, ApiError>
where
	F: Future<Output = Result<T, ApiError>>,
	D: Future,
{
	match select(pin!(request), pin!(deadline)).await {
		Either::Left((result, _)) => result,
		Either::Right(_) => Err(ApiError::Network(TIMED_OUT.into())),
	}
}

/// A `setTimeout` promise and its handle.
fn sleep(window: &Window, duration: Duration) -> Result<(JsFuture, i32), ApiError> {
	let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
	let mut scheduled = Ok(0);
	let promise = Promise::new(&mut |resolve, _reject| {
		scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
	});
	let handle = scheduled.map_err(|e| ApiError::Request(js_message(&e)))?;
	Ok((JsFuture::from(promise), handle))
}

/// Client for the drift detection REST API.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
	base_url: String,
}

impl Default for ApiClient {
	fn default() -> Self {
		Self::new(DEFAULT_BASE_URL)
	}
}

impl ApiClient {
	/// Client rooted at `base_url`. The URL is validated per request.
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.to_string(),
		}
	}

	/// The configured base URL as given.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Builds `<base>/<segments...>?<query>`. Segments are percent-encoded, so
	/// ids containing `/` stay a single path segment.
	pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
		let mut url = Url::parse(&self.base_url)
			.map_err(|e| ApiError::Request(format!("invalid base url {}: {e}", self.base_url)))?;
		url.path_segments_mut()
			.map_err(|()| ApiError::Request(format!("{} cannot be a base url", self.base_url)))?
			.pop_if_empty()
			.extend(segments);
		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}
		Ok(url)
	}

	async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
		let window = web_sys::window().ok_or_else(|| ApiError::Request("no window".into()))?;
		let controller = AbortController::new().map_err(|e| ApiError::Request(js_message(&e)))?;
		let (deadline, timer) = sleep(&window, REQUEST_TIMEOUT)?;

		let result = race_timeout(fetch_text(&window, &url, &controller.signal()), deadline).await;
		window.clear_timeout_with_handle(timer);
		if result.as_ref().is_err_and(ApiError::is_timeout) {
			controller.abort();
			warn!("drift-graph: {url} timed out after {REQUEST_TIMEOUT:?}");
		}
		decode(&result?)
	}

	/// `GET /health`.
	pub async fn health(&self) -> Result<HealthStatus, ApiError> {
		self.get(self.endpoint(&["health"], &[])?).await
	}

	/// `GET /api/v1/drifts` with `query` filters.
	pub async fn list_drifts(&self, query: &DriftQuery) -> Result<DriftList, ApiError> {
		self.get(self.endpoint(&["api", "v1", "drifts"], &query.pairs())?)
			.await
	}

	/// `GET /api/v1/drifts/{id}`.
	pub async fn get_drift(&self, id: &str) -> Result<DriftEvent, ApiError> {
		self.get(self.endpoint(&["api", "v1", "drifts", id], &[])?)
			.await
	}

	/// `GET /api/v1/drifts/stats` over the last `days`.
	pub async fn drift_stats(&self, days: u32) -> Result<DriftStats, ApiError> {
		let url = self.endpoint(&["api", "v1", "drifts", "stats"], &[("days", days.to_string())])?;
		let resp: DriftStatsResponse = self.get(url).await?;
		Ok(resp.stats)
	}

	/// `GET /api/v1/impact` with `query` filters.
	pub async fn list_impact(&self, query: &ImpactQuery) -> Result<ImpactList, ApiError> {
		self.get(self.endpoint(&["api", "v1", "impact"], &query.pairs())?)
			.await
	}

	/// `GET /api/v1/impact/{id}`. A drift without analysis yields `Status(404)`.
	pub async fn get_impact(&self, drift_event_id: &str) -> Result<ImpactAnalysisResult, ApiError> {
		self.get(self.endpoint(&["api", "v1", "impact", drift_event_id], &[])?)
			.await
	}

	/// `GET /api/v1/impact/stats` over the last `days`.
	pub async fn impact_stats(&self, days: u32) -> Result<ImpactStats, ApiError> {
		let url = self.endpoint(&["api", "v1", "impact", "stats"], &[("days", days.to_string())])?;
		let resp: ImpactStatsResponse = self.get(url).await?;
		Ok(resp.stats)
	}

	/// `GET /api/v1/impact/high`: the `limit` most impactful drifts of the last `days`.
	pub async fn high_impact(&self, days: u32, limit: u32) -> Result<HighImpactList, ApiError> {
		let url = self.endpoint(
			&["api", "v1", "impact", "high"],
			&[("days", days.to_string()), ("limit", limit.to_string())],
		)?;
		self.get(url).await
	}

	/// `GET /api/v1/graph`.
	pub async fn graph(&self) -> Result<ResourceGraph, ApiError> {
		self.get(self.endpoint(&["api", "v1", "graph"], &[])?)
			.await
	}
}

async fn fetch_text(window: &Window, url: &Url, signal: &AbortSignal) -> Result<String, ApiError> {
	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::Cors);
	opts.set_signal(Some(signal));

	let request = Request::new_with_str_and_init(url.as_str(), &opts)
		.map_err(|e| ApiError::Request(js_message(&e)))?;
	request
		.headers()
		.set("Accept", "application/json")
		.map_err(|e| ApiError::Request(js_message(&e)))?;

	let value = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(|e| ApiError::Network(js_message(&e)))?;
	let resp: Response = value
		.dyn_into()
		.map_err(|_| ApiError::Network("fetch did not return a Response".into()))?;

	if !resp.ok() {
		return Err(ApiError::Status(resp.status()));
	}

	let text = JsFuture::from(resp.text().map_err(|e| ApiError::Network(js_message(&e)))?)
		.await
		.map_err(|e| ApiError::Network(js_message(&e)))?;
	Ok(text.as_string().unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use futures::future::{pending, ready};

	use super::*;
	use crate::polling::PollGuard;

	#[test]
	fn endpoints_join_segments_and_query() {
		let client = ApiClient::default();
		let url = client
			.endpoint(&["api", "v1", "drifts"], &DriftQuery::with_limit(10).pairs())
			.unwrap();
		assert_eq!(url.as_str(), "http://localhost:8080/api/v1/drifts?limit=10");

		let bare = client.endpoint(&["health"], &[]).unwrap();
		assert_eq!(bare.as_str(), "http://localhost:8080/health");
	}

	#[test]
	fn base_path_prefix_is_kept() {
		for base in ["https://drift.example.com/backend", "https://drift.example.com/backend/"] {
			let url = ApiClient::new(base)
				.endpoint(&["api", "v1", "graph"], &[])
				.unwrap();
			assert_eq!(url.as_str(), "https://drift.example.com/backend/api/v1/graph");
		}
	}

	#[test]
	fn values_are_percent_encoded() {
		let client = ApiClient::default();
		let query = DriftQuery {
			user_identity: Some("a&b=c".into()),
			..Default::default()
		};
		let url = client
			.endpoint(&["api", "v1", "drifts"], &query.pairs())
			.unwrap();
		assert_eq!(url.query(), Some("user_identity=a%26b%3Dc"));

		let url = client.endpoint(&["api", "v1", "impact", "a/b c"], &[]).unwrap();
		assert_eq!(url.path(), "/api/v1/impact/a%2Fb%20c");
	}

	#[test]
	fn invalid_base_is_a_request_error() {
		let err = ApiClient::new("not a url").endpoint(&["health"], &[]).unwrap_err();
		assert!(matches!(err, ApiError::Request(_)));
		let err = ApiClient::new("mailto:ops@example.com")
			.endpoint(&["health"], &[])
			.unwrap_err();
		assert!(matches!(err, ApiError::Request(_)));
	}

	#[test]
	fn decode_reports_body_errors() {
		let list: DriftList = decode(r#"{"drifts": [], "count": 0}"#).unwrap();
		assert!(list.drifts.is_empty());
		assert!(matches!(decode::<DriftList>("<html>"), Err(ApiError::Decode(_))));
		assert!(ApiError::Status(404).is_not_found());
		assert!(!ApiError::Status(500).is_not_found());
	}

	#[test]
	fn deadline_turns_a_hung_request_into_a_network_error() {
		let hung = pending::<Result<u32, ApiError>>();
		let result = block_on(race_timeout(hung, ready(())));
		assert_eq!(result, Err(ApiError::Network("timed out".into())));
		assert!(result.unwrap_err().is_timeout());
		assert!(!ApiError::Network("connection refused".into()).is_timeout());

		let quick = block_on(race_timeout(ready(Ok(7)), pending::<()>()));
		assert_eq!(quick, Ok(7));
	}

	#[test]
	fn timed_out_request_releases_the_poll_guard() {
		let guard = PollGuard::new();
		let ticket = guard.try_begin().unwrap();
		let result = block_on(async move {
			let _ticket = ticket;
			race_timeout(pending::<Result<(), ApiError>>(), ready(())).await
		});
		assert!(result.is_err());
		assert!(!guard.is_busy());
		assert!(guard.try_begin().is_some());
	}
}
