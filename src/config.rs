//! Dashboard configuration embedded in the host page.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::api::DEFAULT_BASE_URL;

/// Id of the `<script type="application/json">` element holding the config.
pub const CONFIG_ELEMENT_ID: &str = "dashboard-config";

/// Settings read at startup. Missing fields take their defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
	/// Root of the backend REST API.
	pub base_url: String,
}

impl Default for DashboardConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
		}
	}
}

impl DashboardConfig {
	/// Parses the config text. A blank `base_url` falls back to the default.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		let mut config: Self = serde_json::from_str(text)?;
		if config.base_url.trim().is_empty() {
			config.base_url = DEFAULT_BASE_URL.to_string();
		}
		Ok(config)
	}

	/// Reads the config element, falling back to defaults when it is missing
	/// or malformed.
	pub fn load() -> Self {
		let Some(text) = config_text() else {
			info!("drift-graph: no #{CONFIG_ELEMENT_ID} element, using {DEFAULT_BASE_URL}");
			return Self::default();
		};
		match Self::from_json(&text) {
			Ok(config) => {
				info!("drift-graph: api base url {}", config.base_url);
				config
			}
			Err(e) => {
				warn!("drift-graph: failed to parse dashboard config: {e}");
				Self::default()
			}
		}
	}
}

fn config_text() -> Option<String> {
	let document = web_sys::window()?.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_base_url() {
		let config = DashboardConfig::from_json(r#"{"base_url": "https://drift.internal/api"}"#).unwrap();
		assert_eq!(config.base_url, "https://drift.internal/api");
	}

	#[test]
	fn missing_or_blank_fields_use_defaults() {
		assert_eq!(DashboardConfig::from_json("{}").unwrap(), DashboardConfig::default());
		let blank = DashboardConfig::from_json(r#"{"base_url": "  "}"#).unwrap();
		assert_eq!(blank.base_url, DEFAULT_BASE_URL);
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(DashboardConfig::from_json("base_url=x").is_err());
	}
}
