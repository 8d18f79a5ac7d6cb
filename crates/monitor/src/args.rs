use std::path::PathBuf;

use clap::Parser;
use evfleet_sync::SyncConfig;

/// Monitor command line arguments.
#[derive(Parser, Debug)]
#[command(name = "evfleet-monitor")]
#[command(about = "Watches live station status through the fleet sync layer")]
pub struct Args {
	/// Configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Station event endpoint, overriding the configuration
	#[arg(long, value_name = "URL")]
	pub endpoint: Option<String>,

	/// Pull API base URL, overriding the configuration
	#[arg(long, value_name = "URL")]
	pub api: Option<String>,

	/// Session token for the channel and the pull API
	#[arg(long)]
	pub token: Option<String>,

	/// Station whose status pushes are watched; repeatable
	#[arg(short, long = "station", value_name = "ID")]
	pub stations: Vec<u64>,

	/// Watch every event of one station instead of status pushes
	#[arg(long, value_name = "ID", conflicts_with = "stations")]
	pub events: Option<u64>,

	/// Skip the initial pulls
	#[arg(long)]
	pub no_pull: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

impl Args {
	/// Loads the configuration file, if any, and applies command line overrides.
	pub fn sync_config(&self) -> evfleet_sync::Result<SyncConfig> {
		let mut config = match &self.config {
			Some(path) => SyncConfig::load(path)?,
			None => SyncConfig::default(),
		};
		if let Some(endpoint) = &self.endpoint {
			config.channel.endpoint.clone_from(endpoint);
		}
		if let Some(api) = &self.api {
			config.api.base_url.clone_from(api);
		}
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests;
