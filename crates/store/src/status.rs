use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::OptionalField;

/// Connector status of a sub-unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvseStatus {
	Available,
	Occupied,
	Reserved,
	Faulted,
	Unavailable,
	/// Anything the server reports that this client does not know.
	#[serde(other)]
	Unknown,
}

impl EvseStatus {
	/// Precedence used when summarizing a station: the first status present wins.
	pub const PRIORITY: [Self; 5] = [Self::Available, Self::Occupied, Self::Reserved, Self::Faulted, Self::Unavailable];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Available => "Available",
			Self::Occupied => "Occupied",
			Self::Reserved => "Reserved",
			Self::Faulted => "Faulted",
			Self::Unavailable => "Unavailable",
			Self::Unknown => "Unknown",
		}
	}

	/// Parses a wire status, mapping unrecognized text to [`EvseStatus::Unknown`].
	pub fn parse(raw: &str) -> Self {
		Self::PRIORITY.into_iter().find(|s| s.as_str() == raw).unwrap_or(Self::Unknown)
	}

	/// Summarizes a station from the statuses of its sub-units.
	///
	/// Returns [`EvseStatus::Unknown`] when no sub-unit reports a prioritized
	/// status, including when there is no status data at all.
	pub fn aggregate(statuses: impl IntoIterator<Item = Self>) -> Self {
		let mut seen = [false; Self::PRIORITY.len()];
		for status in statuses {
			if let Some(rank) = Self::PRIORITY.iter().position(|s| *s == status) {
				seen[rank] = true;
			}
		}
		seen.iter().position(|present| *present).map_or(Self::Unknown, |rank| Self::PRIORITY[rank])
	}
}

impl fmt::Display for EvseStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl OptionalField for Option<EvseStatus> {
	fn is_truthy(&self) -> bool {
		self.is_some()
	}
}

#[cfg(test)]
mod tests;
