use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{Entity, is_truthy_in, merge_extra, optional_fields};

/// One entry of a station's event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationEvent {
	#[serde(alias = "_id")]
	pub id: String,
	#[serde(default, alias = "station_id", skip_serializing_if = "Option::is_none")]
	pub station_id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payload: Option<Value>,
	#[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

optional_fields!(StationEvent {
	station_id,
	source,
	event,
	payload,
	created_at,
});

impl Entity for StationEvent {
	type Key = String;

	const KIND: &'static str = "station_event";

	fn key(&self) -> String {
		self.id.clone()
	}

	fn merge(&mut self, mut changes: Self) {
		self.merge_optional(&mut changes);
		merge_extra(&mut self.extra, changes.extra);
	}

	fn extra(&self) -> &Map<String, Value> {
		&self.extra
	}

	fn has_field(&self, name: &str) -> bool {
		match name {
			"id" | "_id" => !self.id.is_empty(),
			"stationId" => self.station_id.is_some(),
			"createdAt" => self.created_at.is_some(),
			_ => self.optional_present(name).unwrap_or_else(|| is_truthy_in(&self.extra, name)),
		}
	}

	/// Newest first, ties broken by id.
	fn order(a: &Self, b: &Self) -> Ordering {
		b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
	}
}
