//! Station event protocol spoken over the monitoring channel.
//!
//! Every frame is a JSON envelope `{ "action": ..., "payload": ... }`. Pushes
//! carry `{ stationId, event, payload, createdAt }`; replies to requests carry
//! `{ status, statusInfo? }`. A socket has at most one active watch on the
//! server side, so the last watch request is remembered and re-sent every time
//! the channel (re)opens.

use std::sync::Arc;

use evfleet_worker::{OwnedTask, TaskClass};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::frame::InboundMessage;
use crate::manager::{ChannelHandle, ChannelStatus, Subscription};

/// Request and push kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationAction {
	RemoteStart,
	RemoteStop,
	WatchAllEvent,
	WatchStatusEvent,
}

/// Wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	pub action: StationAction,
	#[serde(default)]
	pub payload: Value,
}

/// A pushed station event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationEventPush {
	pub station_id: u64,
	pub event: String,
	#[serde(default)]
	pub payload: Value,
	#[serde(default)]
	pub created_at: Option<String>,
}

impl StationEventPush {
	/// Sub-unit the event concerns. `None` means every sub-unit of the station.
	pub fn evse_id(&self) -> Option<u64> {
		self.payload.get("evseId").and_then(Value::as_u64)
	}

	pub fn connector_status(&self) -> Option<&str> {
		self.payload.get("connectorStatus").and_then(Value::as_str)
	}
}

/// Failure detail attached to a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
	#[serde(default)]
	pub code: Option<u16>,
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
	status: String,
	#[serde(default)]
	status_info: Option<StatusInfo>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StationMessage {
	Event { action: StationAction, event: StationEventPush },
	Reply { action: StationAction, status: String, info: Option<StatusInfo> },
}

impl StationMessage {
	/// Decodes a frame, or returns `None` for frames outside this protocol.
	pub fn decode(message: &InboundMessage) -> Option<Self> {
		let envelope: Envelope = message.decode()?;
		if envelope.payload.get("event").is_some() {
			let event = StationEventPush::deserialize(&envelope.payload).ok()?;
			return Some(Self::Event {
				action: envelope.action,
				event,
			});
		}
		let reply = ReplyBody::deserialize(&envelope.payload).ok()?;
		Some(Self::Reply {
			action: envelope.action,
			status: reply.status,
			info: reply.status_info,
		})
	}

	pub fn is_rejected(&self) -> bool {
		matches!(self, Self::Reply { status, .. } if status == "Rejected")
	}
}

/// Typed request/subscribe surface over a shared monitoring channel.
pub struct StationEventSocket {
	channel: ChannelHandle,
	watch: Arc<Mutex<Option<Envelope>>>,
	_rewatch: OwnedTask,
}

impl StationEventSocket {
	pub fn new(channel: ChannelHandle) -> Self {
		let watch: Arc<Mutex<Option<Envelope>>> = Arc::new(Mutex::new(None));
		let rewatch = OwnedTask::spawn(TaskClass::Network, format!("rewatch:{}", channel.endpoint()), {
			let channel = channel.clone();
			let watch = Arc::clone(&watch);
			move |cancel| async move {
				let mut status = channel.watch_status();
				status.mark_unchanged();
				loop {
					tokio::select! {
						biased;
						_ = cancel.cancelled() => break,
						changed = status.changed() => {
							if changed.is_err() {
								break;
							}
							if *status.borrow_and_update() != ChannelStatus::Open {
								continue;
							}
							let request = watch.lock().clone();
							if let Some(request) = request {
								debug!(endpoint = %channel.endpoint(), action = ?request.action, "station.rewatch");
								channel.send_json(&request);
							}
						}
					}
				}
			}
		});
		Self {
			channel,
			watch,
			_rewatch: rewatch,
		}
	}

	pub fn channel(&self) -> &ChannelHandle {
		&self.channel
	}

	fn request(&self, action: StationAction, payload: Value) -> bool {
		let sent = self.channel.send_json(&Envelope { action, payload });
		if !sent {
			trace!(?action, "station.request_dropped");
		}
		sent
	}

	pub fn remote_start(&self, station_id: u64, evse_id: u64) -> bool {
		self.request(StationAction::RemoteStart, json!({ "stationId": station_id, "evseId": evse_id }))
	}

	pub fn remote_stop(&self, station_id: u64, evse_id: u64) -> bool {
		self.request(StationAction::RemoteStop, json!({ "stationId": station_id, "evseId": evse_id }))
	}

	/// Watches every event of one station, replacing any previous watch.
	pub fn watch_all_events(&self, station_id: u64) -> bool {
		self.remember_and_send(StationAction::WatchAllEvent, json!({ "stationId": station_id }))
	}

	/// Watches status events of the given stations, replacing any previous watch.
	pub fn watch_status_events(&self, station_ids: impl IntoIterator<Item = u64>) -> bool {
		let ids: Vec<u64> = station_ids.into_iter().collect();
		self.remember_and_send(StationAction::WatchStatusEvent, json!({ "stationIdList": ids }))
	}

	fn remember_and_send(&self, action: StationAction, payload: Value) -> bool {
		let envelope = Envelope { action, payload };
		*self.watch.lock() = Some(envelope.clone());
		self.channel.send_json(&envelope)
	}

	/// Stops re-sending the remembered watch on reconnect.
	pub fn forget_watch(&self) {
		self.watch.lock().take();
	}

	/// Subscribes to pushed events of `action`.
	pub fn on_event<F>(&self, action: StationAction, callback: F) -> Subscription
	where
		F: Fn(StationEventPush) + Send + Sync + 'static,
	{
		self.channel.on_message(move |message| {
			if let Some(StationMessage::Event { action: got, event }) = StationMessage::decode(message)
				&& got == action
			{
				callback(event);
			}
		})
	}

	/// Subscribes to request replies.
	pub fn on_reply<F>(&self, callback: F) -> Subscription
	where
		F: Fn(StationMessage) + Send + Sync + 'static,
	{
		self.channel.on_message(move |message| {
			if let Some(reply @ StationMessage::Reply { .. }) = StationMessage::decode(message) {
				callback(reply);
			}
		})
	}
}

#[cfg(test)]
mod tests;
