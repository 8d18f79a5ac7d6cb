use std::sync::Arc;
use std::time::Duration;

use evfleet_worker::CancellationToken;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{ChannelConfig, ChannelInner, ChannelStatus};
use crate::frame::{Frame, InboundMessage};
use crate::transport::{CloseCode, Connection, Transport, TransportEvent};

/// Why a connection's pump loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpExit {
	Cancelled,
	Reconnect,
	HeartbeatMissed,
	Closed(CloseCode),
}

/// Drives one endpoint for the lifetime of its shared channel.
pub(super) async fn run(inner: Arc<ChannelInner>, transport: Arc<dyn Transport>, config: ChannelConfig, cancel: CancellationToken) {
	loop {
		let connected = tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			connection = connect_with_retry(&inner, transport.as_ref(), config.reconnect_attempts) => connection,
		};

		let Some(connection) = connected else {
			inner.set_status(ChannelStatus::Degraded);
			warn!(endpoint = %inner.endpoint, attempts = config.reconnect_attempts, "channel.reconnect_exhausted");
			if !wait_for_retry(&inner, &cancel, Some(config.heartbeat_interval)).await {
				break;
			}
			continue;
		};

		// Requests made while connecting are satisfied by this connection.
		inner.take_reconnect_request();
		let generation = inner.attach(connection.outbound.clone());
		info!(endpoint = %inner.endpoint, generation, "channel.open");
		let exit = pump(&inner, connection, config.heartbeat_interval, &cancel).await;
		inner.detach();

		match exit {
			PumpExit::Cancelled => break,
			PumpExit::Reconnect => {
				debug!(endpoint = %inner.endpoint, generation, "channel.reconnect_requested");
				inner.set_status(ChannelStatus::Connecting);
			}
			PumpExit::HeartbeatMissed => {
				warn!(endpoint = %inner.endpoint, generation, "channel.heartbeat_missed");
				inner.set_status(ChannelStatus::Degraded);
			}
			PumpExit::Closed(code) if code.should_reconnect() => {
				warn!(endpoint = %inner.endpoint, generation, code = code.0, "channel.dropped");
				inner.set_status(ChannelStatus::Connecting);
			}
			PumpExit::Closed(code) => {
				info!(endpoint = %inner.endpoint, generation, code = code.0, "channel.closed");
				inner.set_status(ChannelStatus::Closed);
				if !wait_for_retry(&inner, &cancel, None).await {
					break;
				}
				inner.set_status(ChannelStatus::Connecting);
			}
		}
	}

	inner.detach();
	inner.set_status(ChannelStatus::Closed);
	debug!(endpoint = %inner.endpoint, "channel.driver_exit");
}

async fn connect_with_retry(inner: &ChannelInner, transport: &dyn Transport, attempts: usize) -> Option<Connection> {
	for attempt in 1..=attempts.max(1) {
		match transport.connect(&inner.endpoint).await {
			Ok(connection) => return Some(connection),
			Err(err) => warn!(endpoint = %inner.endpoint, attempt, error = %err, "channel.connect_failed"),
		}
	}
	None
}

/// Parks the driver until a reconnect is requested or `timeout` elapses.
///
/// Returns false when the channel was cancelled instead.
async fn wait_for_retry(inner: &ChannelInner, cancel: &CancellationToken, timeout: Option<Duration>) -> bool {
	let deadline = timeout.map(|t| Instant::now() + t);
	loop {
		let elapsed = async {
			match deadline {
				Some(at) => tokio::time::sleep_until(at).await,
				None => std::future::pending::<()>().await,
			}
		};
		tokio::select! {
			biased;
			_ = cancel.cancelled() => return false,
			_ = inner.reconnect.notified() => {
				if inner.take_reconnect_request() {
					return true;
				}
			}
			_ = elapsed => return true,
		}
	}
}

/// Moves frames for one connection until it ends.
///
/// A probe goes out every `period`. If the previous probe is still unanswered
/// when the next one is due, the link is considered dead.
async fn pump(inner: &ChannelInner, mut connection: Connection, period: Duration, cancel: &CancellationToken) -> PumpExit {
	let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
	heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let mut awaiting_ack = false;

	loop {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => return PumpExit::Cancelled,
			_ = inner.reconnect.notified() => {
				if inner.take_reconnect_request() {
					return PumpExit::Reconnect;
				}
			}
			event = connection.inbound.recv() => match event {
				Some(TransportEvent::Frame(Frame::Ack)) => awaiting_ack = false,
				Some(TransportEvent::Frame(Frame::Probe)) => {
					if connection.outbound.send(Frame::Ack).is_err() {
						return PumpExit::Closed(CloseCode::ABNORMAL);
					}
				}
				Some(TransportEvent::Frame(Frame::Text(text))) => inner.dispatch(&InboundMessage::new(text)),
				Some(TransportEvent::Closed(code)) => return PumpExit::Closed(code),
				None => return PumpExit::Closed(CloseCode::ABNORMAL),
			},
			_ = heartbeat.tick() => {
				if awaiting_ack {
					return PumpExit::HeartbeatMissed;
				}
				if connection.outbound.send(Frame::Probe).is_err() {
					return PumpExit::Closed(CloseCode::ABNORMAL);
				}
				awaiting_ack = true;
			}
		}
	}
}
