use serde::de::DeserializeOwned;
use serde_json::Value;

/// Literal text of a liveness probe.
pub const PROBE: &str = "ping";
/// Literal text of a liveness acknowledgement.
pub const ACK: &str = "pong";

/// One text frame on a push channel.
///
/// Probe and ack frames belong to the heartbeat and are never delivered to
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	Probe,
	Ack,
	Text(String),
}

impl Frame {
	/// Classifies raw frame text.
	pub fn from_text(text: impl Into<String>) -> Self {
		let text = text.into();
		match text.as_str() {
			PROBE => Self::Probe,
			ACK => Self::Ack,
			_ => Self::Text(text),
		}
	}

	pub fn as_text(&self) -> &str {
		match self {
			Self::Probe => PROBE,
			Self::Ack => ACK,
			Self::Text(text) => text,
		}
	}

	pub fn into_text(self) -> String {
		match self {
			Self::Text(text) => text,
			other => other.as_text().to_string(),
		}
	}

	pub const fn is_heartbeat(&self) -> bool {
		matches!(self, Self::Probe | Self::Ack)
	}
}

/// A payload frame delivered to subscribers, parsed as JSON once for all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
	text: String,
	json: Option<Value>,
}

impl InboundMessage {
	pub fn new(text: impl Into<String>) -> Self {
		let text = text.into();
		let json = serde_json::from_str(&text).ok();
		Self { text, json }
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// The frame parsed as JSON, when it is JSON.
	pub fn json(&self) -> Option<&Value> {
		self.json.as_ref()
	}

	/// Deserializes the JSON body into `T`, or `None` when it does not fit.
	pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
		self.json.as_ref().and_then(|value| T::deserialize(value).ok())
	}
}
