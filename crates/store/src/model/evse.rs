use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EvseKey;
use crate::entity::{Entity, is_truthy_in, merge_extra};
use crate::status::EvseStatus;

/// A sub-unit (charging point) of a station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evse {
	#[serde(alias = "stationId")]
	pub station_id: u64,
	#[serde(alias = "evseId")]
	pub evse_id: u64,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Evse {
	pub fn new(key: EvseKey) -> Self {
		Self {
			station_id: key.station_id,
			evse_id: key.evse_id,
			extra: Map::new(),
		}
	}
}

impl Entity for Evse {
	type Key = EvseKey;

	const KIND: &'static str = "evse";

	fn key(&self) -> EvseKey {
		EvseKey::new(self.station_id, self.evse_id)
	}

	fn merge(&mut self, changes: Self) {
		merge_extra(&mut self.extra, changes.extra);
	}

	fn extra(&self) -> &Map<String, Value> {
		&self.extra
	}

	fn has_field(&self, name: &str) -> bool {
		match name {
			"station_id" | "evse_id" => true,
			_ => is_truthy_in(&self.extra, name),
		}
	}
}

/// Live status of one sub-unit, kept apart from the sub-unit itself and
/// joined at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvseStatusRecord {
	#[serde(alias = "station_id")]
	pub station_id: u64,
	#[serde(alias = "evse_id")]
	pub evse_id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<EvseStatus>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl EvseStatusRecord {
	pub fn new(key: EvseKey, status: EvseStatus) -> Self {
		Self {
			station_id: key.station_id,
			evse_id: key.evse_id,
			status: Some(status),
			extra: Map::new(),
		}
	}
}

impl Entity for EvseStatusRecord {
	type Key = EvseKey;

	const KIND: &'static str = "evse_status";

	fn key(&self) -> EvseKey {
		EvseKey::new(self.station_id, self.evse_id)
	}

	fn merge(&mut self, changes: Self) {
		if changes.status.is_some() {
			self.status = changes.status;
		}
		merge_extra(&mut self.extra, changes.extra);
	}

	fn extra(&self) -> &Map<String, Value> {
		&self.extra
	}

	fn has_field(&self, name: &str) -> bool {
		match name {
			"stationId" | "evseId" => true,
			"status" => self.status.is_some(),
			_ => is_truthy_in(&self.extra, name),
		}
	}
}
