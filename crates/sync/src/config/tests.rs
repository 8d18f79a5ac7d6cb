use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_document_is_the_default() {
	let config = SyncConfig::from_toml_str("").unwrap();
	assert_eq!(config, SyncConfig::default());
	assert_eq!(config.batch_window(), Duration::from_secs(5));
	assert_eq!(config.channel_config().heartbeat_interval, Duration::from_secs(30));
	assert_eq!(config.channel_config().reconnect_attempts, 3);
	assert_eq!(config.fetch.page_limit, 25);
	assert_eq!(config.fetch.viewport_precision, 4);
	assert_eq!(config.fetch.min_list_zoom, 13.0);
}

#[test]
fn sections_override_single_fields() {
	let config = SyncConfig::from_toml_str(
		r#"
[channel]
endpoint = "wss://fleet.example/ws/monitoring"

[batch]
window_ms = 250

[api]
base_url = "https://fleet.example/"

[api.paths]
stations = "/v2/stations"
"#,
	)
	.unwrap();

	assert_eq!(config.channel.endpoint, "wss://fleet.example/ws/monitoring");
	assert_eq!(config.channel.heartbeat_interval_ms, 30_000);
	assert_eq!(config.batch_window(), Duration::from_millis(250));
	assert_eq!(config.api.paths.stations, "/v2/stations");
	assert_eq!(config.api.paths.sites, "/api/sites");
	assert_eq!(config.api_base().unwrap().as_str(), "https://fleet.example/");
}

#[test]
fn unknown_keys_are_rejected() {
	let err = SyncConfig::from_toml_str("[batch]\nwindow = 10\n").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)), "{err}");

	let err = SyncConfig::from_toml_str("[metrics]\n").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn invalid_values_name_their_key() {
	let err = SyncConfig::from_toml_str("[batch]\nwindow_ms = 0\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { key: "batch.window_ms", .. }), "{err}");

	let err = SyncConfig::from_toml_str("[channel]\nendpoint = \"not a url\"\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { key: "channel.endpoint", .. }), "{err}");

	let err = SyncConfig::from_toml_str("[fetch]\nscroll_lookahead = -1.0\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { key: "fetch.scroll_lookahead", .. }), "{err}");
}

#[test]
fn missing_file_reports_its_path() {
	let path = Path::new("/nonexistent/evfleet.toml");
	let err = SyncConfig::load(path).unwrap_err();
	match err {
		ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("unexpected error: {other}"),
	}
}
