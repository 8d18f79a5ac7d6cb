use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{Entity, merge_extra};

/// An operator account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: u64,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Entity for User {
	type Key = u64;

	const KIND: &'static str = "user";

	fn key(&self) -> u64 {
		self.id
	}

	fn merge(&mut self, changes: Self) {
		merge_extra(&mut self.extra, changes.extra);
	}

	fn extra(&self) -> &Map<String, Value> {
		&self.extra
	}
}
