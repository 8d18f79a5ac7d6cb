//! The seam between channel management and the wire.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{ChannelError, Result};
use crate::frame::Frame;

/// Address of a push channel. Two handles share a connection iff their endpoints are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Url);

impl Endpoint {
	pub fn parse(raw: &str) -> Result<Self> {
		Url::parse(raw).map(Self).map_err(|source| ChannelError::InvalidEndpoint {
			endpoint: raw.to_string(),
			source,
		})
	}

	/// Appends a query parameter. Empty values are skipped.
	pub fn with_query_param(mut self, key: &str, value: &str) -> Self {
		if !value.is_empty() {
			self.0.query_pairs_mut().append_pair(key, value);
		}
		self
	}

	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0.as_str())
	}
}

/// WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
	pub const NORMAL: Self = Self(1000);
	/// Close frame carried no status.
	pub const NO_STATUS: Self = Self(1005);
	/// Connection dropped without a close frame.
	pub const ABNORMAL: Self = Self(1006);

	/// Closures that indicate a dropped link rather than a deliberate shutdown.
	pub const fn should_reconnect(self) -> bool {
		matches!(self.0, 1005 | 1006)
	}
}

impl fmt::Display for CloseCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Event surfaced by a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	Frame(Frame),
	/// The link is gone. No further events follow.
	Closed(CloseCode),
}

/// A live connection.
///
/// Dropping every clone of `outbound` asks the transport to close the link normally.
#[derive(Debug)]
pub struct Connection {
	pub outbound: mpsc::UnboundedSender<Frame>,
	pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens connections to channel endpoints.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Connection>;
}
