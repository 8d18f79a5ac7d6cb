use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use evfleet_primitives::{LatLng, Positioned};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Located, lenient_string};
use crate::entity::{Entity, is_truthy_in, merge_extra, optional_fields};

/// A charging station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Station {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub site_id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub street_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub zip_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Station {
	pub fn new(id: u64) -> Self {
		Self { id, ..Self::default() }
	}
}

optional_fields!(Station {
	owner_id,
	site_id,
	name,
	latitude,
	longitude,
	street_address,
	city,
	state,
	country,
	zip_code,
	created_at,
});

impl Entity for Station {
	type Key = u64;

	const KIND: &'static str = "station";

	fn key(&self) -> u64 {
		self.id
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
			"id" => self.id != 0,
			_ => self.optional_present(name).unwrap_or_else(|| is_truthy_in(&self.extra, name)),
		}
	}

	/// Oldest first, ties broken by id.
	fn order(a: &Self, b: &Self) -> Ordering {
		a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
	}
}

impl Positioned for Station {
	fn position(&self) -> Option<LatLng> {
		Some(LatLng::new(self.latitude?, self.longitude?))
	}
}

impl Located for Station {
	fn state(&self) -> Option<&str> {
		self.state.as_deref()
	}

	fn city(&self) -> Option<&str> {
		self.city.as_deref()
	}

	fn zip_code(&self) -> Option<&str> {
		self.zip_code.as_deref()
	}
}
