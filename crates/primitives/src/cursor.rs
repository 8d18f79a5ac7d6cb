use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque continuation token handed out by paginated list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
	/// Wraps a raw token. Empty tokens mean "no further pages" and yield `None`.
	pub fn new(raw: impl Into<String>) -> Option<Self> {
		let raw = raw.into();
		(!raw.is_empty()).then_some(Self(raw))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Cursor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The `{ "next": cursor | null }` object attached to list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorEnvelope {
	#[serde(default, deserialize_with = "empty_as_none")]
	pub next: Option<Cursor>,
}

impl CursorEnvelope {
	pub const fn exhausted() -> Self {
		Self { next: None }
	}

	pub fn has_more(&self) -> bool {
		self.next.is_some()
	}
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Cursor>, D::Error> {
	Ok(Option::<String>::deserialize(deserializer)?.and_then(Cursor::new))
}

#[cfg(test)]
mod tests;
