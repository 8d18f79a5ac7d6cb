use clap::Parser;
use evfleet_sync::ConfigError;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn overrides_apply_on_top_of_defaults() {
	let args = Args::try_parse_from(["evfleet-monitor", "--endpoint", "wss://fleet.example/ws/monitoring", "--api", "https://fleet.example/", "-s", "3", "-s", "4"]).unwrap();
	let config = args.sync_config().unwrap();

	assert_eq!(config.channel.endpoint, "wss://fleet.example/ws/monitoring");
	assert_eq!(config.api.base_url, "https://fleet.example/");
	assert_eq!(config.batch, SyncConfig::default().batch);
	assert_eq!(args.stations, vec![3, 4]);
}

#[test]
fn invalid_override_is_rejected() {
	let args = Args::try_parse_from(["evfleet-monitor", "--endpoint", "nowhere"]).unwrap();
	assert!(matches!(args.sync_config(), Err(ConfigError::Invalid { key: "channel.endpoint", .. })));
}

#[test]
fn event_watch_excludes_status_watch() {
	assert!(Args::try_parse_from(["evfleet-monitor", "--events", "3", "--station", "4"]).is_err());
	let args = Args::try_parse_from(["evfleet-monitor", "--events", "3"]).unwrap();
	assert_eq!(args.events, Some(3));
}
