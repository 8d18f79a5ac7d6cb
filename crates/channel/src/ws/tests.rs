use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;

use super::*;

#[tokio::test(flavor = "current_thread")]
async fn server_close_gets_a_close_reply() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let close = CloseFrame {
			code: WsCloseCode::Normal,
			reason: "bye".into(),
		};
		ws.send(Message::Close(Some(close))).await.unwrap();
		ws.next().await
	});

	let endpoint = Endpoint::parse(&format!("ws://{addr}/ws/monitoring")).unwrap();
	let mut connection = WebSocketTransport::new().connect(&endpoint).await.unwrap();
	assert_eq!(connection.inbound.recv().await, Some(TransportEvent::Closed(CloseCode::NORMAL)));

	let reply = server.await.unwrap();
	assert!(matches!(reply, Some(Ok(Message::Close(_)))), "server saw {reply:?}");
}
