//! Runtime configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [channel]
//! endpoint = "ws://localhost:3000/ws/monitoring"
//! heartbeat_interval_ms = 30000
//! reconnect_attempts = 3
//!
//! [batch]
//! window_ms = 5000
//!
//! [fetch]
//! page_limit = 25
//! scroll_lookahead = 0.0
//! viewport_precision = 4
//! min_list_zoom = 13.0
//!
//! [api]
//! base_url = "http://localhost:3000/"
//! ```
//!
//! Durations are in milliseconds. Unknown keys are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use evfleet_channel::{ChannelConfig, Endpoint};
use evfleet_fetch::{ApiPaths, DEFAULT_VIEWPORT_PRECISION};
use evfleet_view_state::DEFAULT_MIN_LIST_ZOOM;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("invalid value for `{key}`: {reason}")]
	Invalid { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSection {
	/// Station event WebSocket endpoint. The session token is appended as `token`.
	pub endpoint: String,
	pub heartbeat_interval_ms: u64,
	pub reconnect_attempts: usize,
}

impl Default for ChannelSection {
	fn default() -> Self {
		Self {
			endpoint: "ws://localhost:3000/ws/monitoring".into(),
			heartbeat_interval_ms: 30_000,
			reconnect_attempts: 3,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSection {
	pub window_ms: u64,
}

impl Default for BatchSection {
	fn default() -> Self {
		Self { window_ms: 5_000 }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSection {
	/// Items per list page. Zero leaves the limit to the server.
	pub page_limit: u32,
	/// Distance from the end of a list at which the next page is requested.
	pub scroll_lookahead: f64,
	/// Decimal places of the viewport key.
	pub viewport_precision: u32,
	/// Zoom at which the map switches to listing individual stations.
	pub min_list_zoom: f64,
}

impl Default for FetchSection {
	fn default() -> Self {
		Self {
			page_limit: 25,
			scroll_lookahead: 0.0,
			viewport_precision: DEFAULT_VIEWPORT_PRECISION,
			min_list_zoom: DEFAULT_MIN_LIST_ZOOM,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
	pub base_url: String,
	pub paths: ApiPaths,
}

impl Default for ApiSection {
	fn default() -> Self {
		Self {
			base_url: "http://localhost:3000/".into(),
			paths: ApiPaths::default(),
		}
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
	pub channel: ChannelSection,
	pub batch: BatchSection,
	pub fetch: FetchSection,
	pub api: ApiSection,
}

impl SyncConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(raw: &str) -> Result<Self> {
		let config: Self = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&raw)
	}

	pub fn validate(&self) -> Result<()> {
		self.endpoint()?;
		self.api_base()?;
		if self.channel.heartbeat_interval_ms == 0 {
			return Err(invalid("channel.heartbeat_interval_ms", "must be greater than zero"));
		}
		if self.batch.window_ms == 0 {
			return Err(invalid("batch.window_ms", "must be greater than zero"));
		}
		if !self.fetch.scroll_lookahead.is_finite() || self.fetch.scroll_lookahead < 0.0 {
			return Err(invalid("fetch.scroll_lookahead", "must be a finite, non-negative number"));
		}
		if self.fetch.viewport_precision > 12 {
			return Err(invalid("fetch.viewport_precision", "must be at most 12"));
		}
		if !self.fetch.min_list_zoom.is_finite() {
			return Err(invalid("fetch.min_list_zoom", "must be finite"));
		}
		Ok(())
	}

	pub fn endpoint(&self) -> Result<Endpoint> {
		Endpoint::parse(&self.channel.endpoint).map_err(|e| invalid("channel.endpoint", e))
	}

	pub fn api_base(&self) -> Result<Url> {
		Url::parse(&self.api.base_url).map_err(|e| invalid("api.base_url", e))
	}

	pub fn channel_config(&self) -> ChannelConfig {
		ChannelConfig {
			heartbeat_interval: Duration::from_millis(self.channel.heartbeat_interval_ms),
			reconnect_attempts: self.channel.reconnect_attempts,
		}
	}

	pub fn batch_window(&self) -> Duration {
		Duration::from_millis(self.batch.window_ms)
	}
}

fn invalid(key: &'static str, reason: impl ToString) -> ConfigError {
	ConfigError::Invalid {
		key,
		reason: reason.to_string(),
	}
}

#[cfg(test)]
mod tests;
