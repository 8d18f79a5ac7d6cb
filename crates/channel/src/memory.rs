//! In-process transport for tests.
//!
//! Every successful [`Transport::connect`] hands the far end of the link to the
//! test as a [`MemoryPeer`] through [`MemoryPeers`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{ChannelError, Result};
use crate::frame::Frame;
use crate::transport::{CloseCode, Connection, Endpoint, Transport, TransportEvent};

/// Transport whose connections terminate in the test itself.
#[derive(Debug)]
pub struct MemoryTransport {
	peers_tx: mpsc::UnboundedSender<MemoryPeer>,
	/// Single-take receiver for accepted peers.
	peers_rx: Mutex<Option<mpsc::UnboundedReceiver<MemoryPeer>>>,
	connects: AtomicUsize,
	fail_next: AtomicUsize,
	delay: Mutex<Option<Duration>>,
}

impl MemoryTransport {
	pub fn new() -> Arc<Self> {
		let (peers_tx, peers_rx) = mpsc::unbounded_channel();
		Arc::new(Self {
			peers_tx,
			peers_rx: Mutex::new(Some(peers_rx)),
			connects: AtomicUsize::new(0),
			fail_next: AtomicUsize::new(0),
			delay: Mutex::new(None),
		})
	}

	/// Takes the stream of accepted peers. Returns `None` after the first call.
	pub fn take_peers(&self) -> Option<MemoryPeers> {
		self.peers_rx.lock().take().map(MemoryPeers)
	}

	/// Makes the next `count` connection attempts fail.
	pub fn fail_next(&self, count: usize) {
		self.fail_next.store(count, Ordering::SeqCst);
	}

	/// Makes every later connection attempt take `delay` before it resolves.
	pub fn delay_connects(&self, delay: Duration) {
		*self.delay.lock() = Some(delay);
	}

	/// Number of connection attempts, failed ones included.
	pub fn connect_count(&self) -> usize {
		self.connects.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
		self.connects.fetch_add(1, Ordering::SeqCst);
		let delay = *self.delay.lock();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail_next.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
			return Err(ChannelError::Open {
				endpoint: endpoint.to_string(),
				reason: "refused".to_string(),
			});
		}

		let (outbound, from_client) = mpsc::unbounded_channel();
		let (to_client, inbound) = mpsc::unbounded_channel();
		let peer = MemoryPeer {
			endpoint: endpoint.to_string(),
			to_client,
			from_client,
		};
		self.peers_tx.send(peer).map_err(|_| ChannelError::Open {
			endpoint: endpoint.to_string(),
			reason: "peer stream dropped".to_string(),
		})?;
		Ok(Connection { outbound, inbound })
	}
}

/// Accepted peers, in connection order.
#[derive(Debug)]
pub struct MemoryPeers(mpsc::UnboundedReceiver<MemoryPeer>);

impl MemoryPeers {
	pub async fn next(&mut self) -> Option<MemoryPeer> {
		self.0.recv().await
	}

	pub fn try_next(&mut self) -> Option<MemoryPeer> {
		self.0.try_recv().ok()
	}
}

/// Server side of one in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
	endpoint: String,
	to_client: mpsc::UnboundedSender<TransportEvent>,
	from_client: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryPeer {
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn send(&self, frame: Frame) -> bool {
		self.to_client.send(TransportEvent::Frame(frame)).is_ok()
	}

	pub fn send_text(&self, text: &str) -> bool {
		self.send(Frame::from_text(text))
	}

	/// Closes the link from the server side with `code`.
	pub fn close(&self, code: CloseCode) {
		let _ = self.to_client.send(TransportEvent::Closed(code));
	}

	/// Stops accepting frames from the client while keeping the link open.
	pub fn stop_reading(&mut self) {
		self.from_client.close();
	}

	pub async fn recv(&mut self) -> Option<Frame> {
		self.from_client.recv().await
	}

	pub fn try_recv(&mut self) -> Option<Frame> {
		self.from_client.try_recv().ok()
	}

	/// Every frame the client has sent so far.
	pub fn drain(&mut self) -> Vec<Frame> {
		std::iter::from_fn(|| self.try_recv()).collect()
	}

	/// True while the client still holds its sending half.
	pub fn is_connected(&self) -> bool {
		!self.from_client.is_closed()
	}
}
