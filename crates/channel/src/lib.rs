//! Push-side plumbing for the fleet sync stack.
//!
//! - [`ChannelManager`] hands out reference-counted [`ChannelHandle`]s, one
//!   shared connection per endpoint, with heartbeat and reconnect handled by a
//!   per-endpoint driver task.
//! - [`UpdateBatcher`] turns a burst of pushes into one delivery per window.
//! - [`StationEventSocket`] speaks the station event protocol on top of a channel.
//! - [`Transport`] is the wire seam; [`WebSocketTransport`] is the production
//!   implementation.

pub mod batch;
pub mod error;
pub mod frame;
pub mod manager;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod protocol;
pub mod transport;
pub mod ws;

pub use batch::{DEFAULT_FLUSH_INTERVAL, RecordOutcome, UpdateBatcher};
pub use error::{ChannelError, Result};
pub use frame::{Frame, InboundMessage};
pub use manager::{ChannelConfig, ChannelHandle, ChannelManager, ChannelStatus, Subscription};
pub use protocol::{StationAction, StationEventPush, StationEventSocket, StationMessage, StatusInfo};
pub use transport::{CloseCode, Connection, Endpoint, Transport, TransportEvent};
pub use ws::WebSocketTransport;
