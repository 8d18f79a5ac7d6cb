//! Entity kinds held by the store.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entity::ChildKey;

mod event;
mod evse;
mod site;
mod station;
mod user;

pub use event::StationEvent;
pub use evse::{Evse, EvseStatusRecord};
pub use site::Site;
pub use station::Station;
pub use user::User;

/// Identity of a sub-unit: the owning station plus the sub-unit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvseKey {
	pub station_id: u64,
	pub evse_id: u64,
}

impl EvseKey {
	pub const fn new(station_id: u64, evse_id: u64) -> Self {
		Self { station_id, evse_id }
	}
}

impl std::fmt::Display for EvseKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{},{}", self.station_id, self.evse_id)
	}
}

impl ChildKey for EvseKey {
	type Parent = u64;

	fn parent(&self) -> u64 {
		self.station_id
	}

	fn first_of(parent: &u64) -> Self {
		Self::new(*parent, u64::MIN)
	}

	fn last_of(parent: &u64) -> Self {
		Self::new(*parent, u64::MAX)
	}
}

/// Address fields used to build location filters.
pub trait Located {
	fn state(&self) -> Option<&str>;
	fn city(&self) -> Option<&str>;
	fn zip_code(&self) -> Option<&str>;
}

/// Accepts strings and numbers for fields that some services send as either.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::String(s)) => Some(s),
		Some(Value::Number(n)) => Some(n.to_string()),
		_ => None,
	})
}
