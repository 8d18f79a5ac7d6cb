//! Headless station monitor.
//!
//! Connects the sync layer to the station event endpoint, seeds the store
//! from the pull API and logs live status until interrupted.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use evfleet_channel::WebSocketTransport;
use evfleet_fetch::{FetchRequest, FetchSite};
use evfleet_sync::SyncLayer;
use tracing::{error, info, warn};

mod args;

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let config = args.sync_config().context("loading configuration")?;
	info!(endpoint = %config.channel.endpoint, api = %config.api.base_url, "starting evfleet-monitor");

	let layer = SyncLayer::new(config, Arc::new(WebSocketTransport::new()))?;
	layer.connect(args.token.as_deref());
	match args.events {
		Some(station) => {
			layer.watch_station(station);
		}
		None if !args.stations.is_empty() => {
			layer.watch_status(args.stations.iter().copied());
		}
		None => {}
	}

	let seed = FetchSite::new("monitor.stations", layer.error_sink());
	if !args.no_pull {
		let pull = layer.pull_stations(layer.list_query());
		seed.mount(FetchRequest::new("initial"), move || pull);
		for &station in &args.stations {
			let detail = layer.pull_station_detail(station);
			let errors = layer.error_sink();
			tokio::spawn(async move {
				if let Err(err) = detail.await {
					errors.report(err.to_report());
				}
			});
		}
	}

	let Some(mut status) = layer.watch_channel() else {
		anyhow::bail!("live feed is not open");
	};
	let mut errors = layer.errors().watch();
	let mut summary = tokio::time::interval(layer.config().batch_window());
	let shutdown = tokio::signal::ctrl_c();
	tokio::pin!(shutdown);

	loop {
		tokio::select! {
			_ = &mut shutdown => {
				info!("shutting down");
				break;
			}
			changed = status.changed() => {
				if changed.is_err() {
					warn!("session ended");
					break;
				}
				info!(status = ?*status.borrow_and_update(), "monitor.channel");
			}
			changed = errors.changed() => {
				if changed.is_err() {
					break;
				}
				if let Some(report) = errors.borrow_and_update().clone() {
					error!(status = ?report.status, name = %report.name, message = %report.message, "monitor.error");
				}
			}
			_ = summary.tick() => log_summary(&layer, &args.stations),
		}
	}

	seed.cancel();
	layer.disconnect();
	Ok(())
}

fn log_summary(layer: &SyncLayer, stations: &[u64]) {
	layer.store().read(|store| {
		if stations.is_empty() {
			info!(stations = store.stations().len(), statuses = store.evse_statuses().len(), events = store.events().len(), "monitor.summary");
			return;
		}
		for &station in stations {
			let evses: Vec<String> = store
				.evses_with_status(station)
				.into_iter()
				.map(|(evse, status)| format!("{}={}", evse.evse_id, status.as_str()))
				.collect();
			info!(station, status = store.station_status(station).as_str(), evses = %evses.join(" "), "monitor.station");
		}
	});
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("EVFLEET_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("debug,tungstenite=info,hyper_util=info,reqwest=info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
