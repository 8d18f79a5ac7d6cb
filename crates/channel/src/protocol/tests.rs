use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;
use crate::frame::Frame;
use crate::manager::{ChannelConfig, ChannelManager};
use crate::memory::{MemoryPeers, MemoryTransport};
use crate::transport::{CloseCode, Endpoint};

async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

fn setup() -> (ChannelManager, Arc<MemoryTransport>, MemoryPeers, Endpoint) {
	let transport = MemoryTransport::new();
	let peers = transport.take_peers().unwrap();
	let manager = ChannelManager::new(transport.clone(), ChannelConfig::default());
	let endpoint = Endpoint::parse("ws://fleet.test/monitoring").unwrap().with_query_param("token", "t0k");
	(manager, transport, peers, endpoint)
}

fn sent_json(frames: Vec<Frame>) -> Vec<Value> {
	frames
		.into_iter()
		.filter_map(|f| match f {
			Frame::Text(text) => serde_json::from_str(&text).ok(),
			_ => None,
		})
		.collect()
}

#[test]
fn decodes_status_push() {
	let msg = InboundMessage::new(
		r#"{"action":"WatchStatusEvent","payload":{"stationId":7,"event":"StatusNotification","payload":{"evseId":2,"connectorStatus":"Occupied"},"createdAt":"2024-05-01T10:00:00Z"}}"#,
	);
	let Some(StationMessage::Event { action, event }) = StationMessage::decode(&msg) else {
		panic!("expected an event");
	};
	assert_eq!(action, StationAction::WatchStatusEvent);
	assert_eq!(event.station_id, 7);
	assert_eq!(event.evse_id(), Some(2));
	assert_eq!(event.connector_status(), Some("Occupied"));
}

#[test]
fn decodes_rejected_reply() {
	let msg = InboundMessage::new(
		r#"{"action":"WatchAllEvent","payload":{"status":"Rejected","statusInfo":{"code":403,"message":"Access denied"}}}"#,
	);
	let decoded = StationMessage::decode(&msg).unwrap();
	assert!(decoded.is_rejected());
	assert_eq!(
		decoded,
		StationMessage::Reply {
			action: StationAction::WatchAllEvent,
			status: "Rejected".into(),
			info: Some(StatusInfo {
				code: Some(403),
				message: Some("Access denied".into()),
			}),
		}
	);
}

#[test]
fn ignores_foreign_frames() {
	assert_eq!(StationMessage::decode(&InboundMessage::new("hello")), None);
	assert_eq!(StationMessage::decode(&InboundMessage::new(r#"{"action":"Other"}"#)), None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn endpoint_carries_token() {
	let (manager, _transport, mut peers, endpoint) = setup();
	let _socket = StationEventSocket::new(manager.open(&endpoint));
	let peer = peers.next().await.unwrap();
	assert_eq!(peer.endpoint(), "ws://fleet.test/monitoring?token=t0k");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn requests_are_dropped_while_not_open() {
	let (manager, transport, _peers, endpoint) = setup();
	transport.fail_next(3);
	let socket = StationEventSocket::new(manager.open(&endpoint));
	settle().await;

	assert!(!socket.remote_start(1, 1));
	assert!(!socket.remote_stop(1, 1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn watch_is_resent_after_reconnect() {
	let (manager, _transport, mut peers, endpoint) = setup();
	let socket = StationEventSocket::new(manager.open(&endpoint));
	let mut first = peers.next().await.unwrap();
	settle().await;

	assert!(socket.watch_status_events([3, 4]));
	assert!(socket.remote_start(3, 1));
	assert_eq!(
		sent_json(first.drain()),
		vec![
			json!({"action": "WatchStatusEvent", "payload": {"stationIdList": [3, 4]}}),
			json!({"action": "RemoteStart", "payload": {"stationId": 3, "evseId": 1}}),
		]
	);

	first.close(CloseCode::ABNORMAL);
	let mut second = peers.next().await.unwrap();
	settle().await;

	assert_eq!(
		sent_json(second.drain()),
		vec![json!({"action": "WatchStatusEvent", "payload": {"stationIdList": [3, 4]}})]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn watch_requested_before_open_is_sent_on_open() {
	let (manager, transport, mut peers, endpoint) = setup();
	transport.fail_next(3);
	let socket = StationEventSocket::new(manager.open(&endpoint));
	settle().await;

	assert!(!socket.watch_all_events(9));
	tokio::time::sleep(Duration::from_secs(30)).await;
	let mut peer = peers.next().await.unwrap();
	settle().await;

	assert_eq!(
		sent_json(peer.drain()),
		vec![json!({"action": "WatchAllEvent", "payload": {"stationId": 9}})]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn event_subscribers_filter_by_action() {
	let (manager, _transport, mut peers, endpoint) = setup();
	let socket = StationEventSocket::new(manager.open(&endpoint));
	let peer = peers.next().await.unwrap();

	let statuses = Arc::new(Mutex::new(Vec::new()));
	let _sub = socket.on_event(StationAction::WatchStatusEvent, {
		let statuses = Arc::clone(&statuses);
		move |event| statuses.lock().push(event.station_id)
	});
	let replies = Arc::new(Mutex::new(0usize));
	let _replies = socket.on_reply({
		let replies = Arc::clone(&replies);
		move |_| *replies.lock() += 1
	});

	peer.send_text(r#"{"action":"WatchAllEvent","payload":{"stationId":1,"event":"Heartbeat","payload":{}}}"#);
	peer.send_text(r#"{"action":"WatchStatusEvent","payload":{"stationId":2,"event":"StatusNotification","payload":{}}}"#);
	peer.send_text(r#"{"action":"WatchStatusEvent","payload":{"status":"Accepted"}}"#);
	settle().await;

	assert_eq!(*statuses.lock(), vec![2]);
	assert_eq!(*replies.lock(), 1);
}
