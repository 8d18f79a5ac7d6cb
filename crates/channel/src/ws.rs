//! WebSocket transport.

use async_trait::async_trait;
use evfleet_worker::{TaskClass, spawn};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tracing::{debug, warn};

use crate::error::{ChannelError, Result};
use crate::frame::Frame;
use crate::transport::{CloseCode, Connection, Endpoint, Transport, TransportEvent};

/// Opens text-frame WebSocket connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl WebSocketTransport {
	pub const fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Transport for WebSocketTransport {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
		let (stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
			.await
			.map_err(|e| ChannelError::Open {
				endpoint: endpoint.to_string(),
				reason: e.to_string(),
			})?;
		debug!(%endpoint, "ws.connected");

		let (mut sink, mut source) = stream.split();
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let label = endpoint.to_string();

		spawn(TaskClass::Network, async move {
			let code = loop {
				tokio::select! {
					outbound = outbound_rx.recv() => match outbound {
						Some(frame) => {
							if let Err(err) = sink.send(Message::Text(frame.into_text().into())).await {
								warn!(endpoint = %label, error = %err, "ws.send_failed");
								break CloseCode::ABNORMAL;
							}
						}
						None => {
							let close = CloseFrame {
								code: WsCloseCode::Normal,
								reason: "".into(),
							};
							let _ = sink.send(Message::Close(Some(close))).await;
							debug!(endpoint = %label, "ws.closed_locally");
							break CloseCode::NORMAL;
						}
					},
					inbound = source.next() => match inbound {
						Some(Ok(Message::Text(text))) => {
							let _ = inbound_tx.send(TransportEvent::Frame(Frame::from_text(text.to_string())));
						}
						Some(Ok(Message::Close(frame))) => {
							// Flushes the queued close reply.
							let _ = sink.close().await;
							break frame.map_or(CloseCode::NO_STATUS, |f| CloseCode(u16::from(f.code)));
						}
						Some(Ok(_)) => {}
						Some(Err(err)) => {
							warn!(endpoint = %label, error = %err, "ws.recv_failed");
							break CloseCode::ABNORMAL;
						}
						None => break CloseCode::ABNORMAL,
					},
				}
			};
			debug!(endpoint = %label, code = code.0, "ws.io_exit");
			let _ = inbound_tx.send(TransportEvent::Closed(code));
		});

		Ok(Connection {
			outbound: outbound_tx,
			inbound: inbound_rx,
		})
	}
}

#[cfg(test)]
mod tests;
