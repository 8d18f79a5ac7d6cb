//! Shared, self-healing push channels.
//!
//! ```text
//!   ChannelHandle ─┐
//!   ChannelHandle ─┼─> ChannelShared ─> driver task ─> Transport::connect
//!   ChannelHandle ─┘        │                │
//!                       listeners <─ dispatch┘
//! ```
//!
//! One driver task exists per endpoint. It owns the live connection, answers
//! and sends heartbeats, and reconnects after a dropped link. Handles are
//! reference counted; the driver is cancelled when the last handle drops.
//! Listeners live on the shared state, so they survive reconnects.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use evfleet_worker::{GenerationClock, OwnedTask, TaskClass};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, trace, warn};

use crate::frame::{Frame, InboundMessage};
use crate::transport::{Endpoint, Transport};

mod driver;

/// Interval between liveness probes.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Immediate connection attempts before the channel reports itself degraded.
pub const DEFAULT_RECONNECT_ATTEMPTS: usize = 3;

/// Channel timing and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
	pub heartbeat_interval: Duration,
	pub reconnect_attempts: usize,
}

impl Default for ChannelConfig {
	fn default() -> Self {
		Self {
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
		}
	}
}

/// Connection state as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
	/// First connection attempt, or reconnecting after a dropped link.
	Connecting,
	Open,
	/// Reconnect attempts failed or a heartbeat went unanswered.
	Degraded,
	/// Closed normally by the server; waits for [`ChannelHandle::reconnect`].
	Closed,
}

type MessageFilter = Arc<dyn Fn(&InboundMessage) -> bool + Send + Sync>;
type MessageCallback = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

struct Listener {
	filter: Option<MessageFilter>,
	callback: MessageCallback,
}

struct ChannelInner {
	endpoint: Endpoint,
	listeners: RwLock<BTreeMap<u64, Listener>>,
	next_listener: AtomicU64,
	outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
	status: watch::Sender<ChannelStatus>,
	generations: GenerationClock,
	reconnect_requested: AtomicBool,
	reconnect: Notify,
}

impl ChannelInner {
	fn new(endpoint: Endpoint) -> Self {
		let (status, _) = watch::channel(ChannelStatus::Connecting);
		Self {
			endpoint,
			listeners: RwLock::new(BTreeMap::new()),
			next_listener: AtomicU64::new(1),
			outbound: Mutex::new(None),
			status,
			generations: GenerationClock::new(),
			reconnect_requested: AtomicBool::new(false),
			reconnect: Notify::new(),
		}
	}

	fn status(&self) -> ChannelStatus {
		*self.status.borrow()
	}

	fn set_status(&self, next: ChannelStatus) {
		let changed = self.status.send_if_modified(|current| {
			if *current == next {
				return false;
			}
			*current = next;
			true
		});
		if changed {
			debug!(endpoint = %self.endpoint, status = ?next, "channel.status");
		}
	}

	/// Installs the sender of a fresh connection and returns its generation.
	fn attach(&self, outbound: mpsc::UnboundedSender<Frame>) -> u64 {
		*self.outbound.lock() = Some(outbound);
		let generation = self.generations.next();
		self.set_status(ChannelStatus::Open);
		generation
	}

	fn detach(&self) {
		self.outbound.lock().take();
	}

	fn send(&self, frame: Frame) -> bool {
		if self.status() != ChannelStatus::Open {
			trace!(endpoint = %self.endpoint, "channel.send_dropped");
			return false;
		}
		self.outbound.lock().as_ref().is_some_and(|tx| tx.send(frame).is_ok())
	}

	fn request_reconnect(&self) {
		if !self.reconnect_requested.swap(true, Ordering::AcqRel) {
			self.reconnect.notify_one();
		}
	}

	fn take_reconnect_request(&self) -> bool {
		self.reconnect_requested.swap(false, Ordering::AcqRel)
	}

	fn subscribe(self: &Arc<Self>, filter: Option<MessageFilter>, callback: MessageCallback) -> Subscription {
		let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
		self.listeners.write().insert(id, Listener { filter, callback });
		Subscription {
			inner: Arc::downgrade(self),
			id,
		}
	}

	/// Delivers `message` to every matching listener.
	///
	/// Listener closures run without the listener lock held, so they may
	/// subscribe or unsubscribe.
	fn dispatch(&self, message: &InboundMessage) {
		let listeners: Vec<(Option<MessageFilter>, MessageCallback)> = self
			.listeners
			.read()
			.values()
			.map(|l| (l.filter.clone(), Arc::clone(&l.callback)))
			.collect();
		for (filter, callback) in listeners {
			if filter.is_none_or(|f| f(message)) {
				callback(message);
			}
		}
	}
}

struct ChannelShared {
	inner: Arc<ChannelInner>,
	_driver: OwnedTask,
}

/// Reference-counted handle to a shared channel.
#[derive(Clone)]
pub struct ChannelHandle {
	shared: Arc<ChannelShared>,
}

impl ChannelHandle {
	pub fn endpoint(&self) -> &Endpoint {
		&self.shared.inner.endpoint
	}

	pub fn status(&self) -> ChannelStatus {
		self.shared.inner.status()
	}

	pub fn is_open(&self) -> bool {
		self.status() == ChannelStatus::Open
	}

	/// Observes status transitions.
	pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
		self.shared.inner.status.subscribe()
	}

	/// Generation of the current (or last) connection. Starts at 1.
	pub fn generation(&self) -> u64 {
		self.shared.inner.generations.current()
	}

	/// Number of live handles sharing this channel.
	pub fn handle_count(&self) -> usize {
		Arc::strong_count(&self.shared)
	}

	/// Sends a frame. Returns false, dropping the frame, unless the channel is open.
	pub fn send(&self, frame: Frame) -> bool {
		self.shared.inner.send(frame)
	}

	pub fn send_text(&self, text: impl Into<String>) -> bool {
		self.send(Frame::from_text(text))
	}

	pub fn send_json<T: Serialize>(&self, value: &T) -> bool {
		match serde_json::to_string(value) {
			Ok(text) => self.send(Frame::Text(text)),
			Err(err) => {
				warn!(endpoint = %self.endpoint(), error = %err, "channel.encode_failed");
				false
			}
		}
	}

	/// Registers `callback` for every payload message.
	pub fn on_message<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&InboundMessage) + Send + Sync + 'static,
	{
		self.shared.inner.subscribe(None, Arc::new(callback))
	}

	/// Registers `callback` for payload messages accepted by `filter`.
	pub fn on_message_where<P, F>(&self, filter: P, callback: F) -> Subscription
	where
		P: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
		F: Fn(&InboundMessage) + Send + Sync + 'static,
	{
		self.shared.inner.subscribe(Some(Arc::new(filter)), Arc::new(callback))
	}

	/// Asks the driver to drop the current link and connect again.
	///
	/// Requests made before the driver picks the first one up collapse into a
	/// single reconnect.
	pub fn reconnect(&self) {
		self.shared.inner.request_reconnect();
	}
}

impl std::fmt::Debug for ChannelHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChannelHandle")
			.field("endpoint", &self.endpoint().as_str())
			.field("status", &self.status())
			.finish()
	}
}

/// Listener registration. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
#[derive(Debug)]
pub struct Subscription {
	inner: Weak<ChannelInner>,
	id: u64,
}

impl Subscription {
	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(inner) = self.inner.upgrade() {
			inner.listeners.write().remove(&self.id);
		}
	}
}

/// Hands out shared channels, one connection per endpoint.
pub struct ChannelManager {
	transport: Arc<dyn Transport>,
	config: ChannelConfig,
	channels: Mutex<HashMap<Endpoint, Weak<ChannelShared>>>,
}

impl ChannelManager {
	pub fn new(transport: Arc<dyn Transport>, config: ChannelConfig) -> Self {
		Self {
			transport,
			config,
			channels: Mutex::new(HashMap::new()),
		}
	}

	pub fn config(&self) -> ChannelConfig {
		self.config
	}

	/// Returns a handle to the channel for `endpoint`, opening it if no live handle exists.
	pub fn open(&self, endpoint: &Endpoint) -> ChannelHandle {
		let mut channels = self.channels.lock();
		channels.retain(|_, weak| weak.strong_count() > 0);

		if let Some(shared) = channels.get(endpoint).and_then(Weak::upgrade) {
			trace!(%endpoint, "channel.reuse");
			return ChannelHandle { shared };
		}

		let inner = Arc::new(ChannelInner::new(endpoint.clone()));
		let driver = OwnedTask::spawn(TaskClass::Network, format!("channel:{endpoint}"), {
			let inner = Arc::clone(&inner);
			let transport = Arc::clone(&self.transport);
			let config = self.config;
			move |cancel| driver::run(inner, transport, config, cancel)
		});
		let shared = Arc::new(ChannelShared { inner, _driver: driver });
		channels.insert(endpoint.clone(), Arc::downgrade(&shared));
		debug!(%endpoint, "channel.create");
		ChannelHandle { shared }
	}

	/// Number of endpoints with at least one live handle.
	pub fn open_channels(&self) -> usize {
		self.channels.lock().values().filter(|weak| weak.strong_count() > 0).count()
	}
}
