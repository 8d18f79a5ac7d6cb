//! Windowed delivery of high-frequency push updates.
//!
//! Updates are buffered and handed to the callback one by one, in arrival
//! order, when the window elapses. The timer re-arms after every flush and
//! keeps running through empty windows. With a coalescing key, a newer update
//! replaces the buffered one with the same key in place, so the callback sees
//! only the latest value per key per window.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use evfleet_worker::{OwnedTask, TaskClass, spawn_periodic};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Default flush window.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

type Deliver<T> = Arc<dyn Fn(T) + Send + Sync>;
type SameKey<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// What happened to a recorded update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
	Queued,
	/// A buffered update with the same key was replaced.
	Coalesced,
	/// The batcher was cancelled; the update was dropped.
	Discarded,
}

struct BatchShared<T> {
	pending: Mutex<VecDeque<T>>,
	same_key: Option<SameKey<T>>,
	deliver: Deliver<T>,
}

impl<T> BatchShared<T> {
	fn flush(&self) -> usize {
		let drained = std::mem::take(&mut *self.pending.lock());
		let count = drained.len();
		for update in drained {
			(self.deliver)(update);
		}
		count
	}
}

/// Buffers updates and delivers them once per window.
pub struct UpdateBatcher<T> {
	shared: Arc<BatchShared<T>>,
	timer: OwnedTask,
}

impl<T: Send + 'static> UpdateBatcher<T> {
	/// Delivers every recorded update.
	pub fn new<F>(window: Duration, deliver: F) -> Self
	where
		F: Fn(T) + Send + Sync + 'static,
	{
		Self::build(window, None, Arc::new(deliver))
	}

	/// Delivers only the latest update per key within each window.
	pub fn coalescing<K, KF, F>(window: Duration, key: KF, deliver: F) -> Self
	where
		K: PartialEq,
		KF: Fn(&T) -> K + Send + Sync + 'static,
		F: Fn(T) + Send + Sync + 'static,
	{
		Self::build(window, Some(Arc::new(move |a: &T, b: &T| key(a) == key(b))), Arc::new(deliver))
	}

	fn build(window: Duration, same_key: Option<SameKey<T>>, deliver: Deliver<T>) -> Self {
		let shared = Arc::new(BatchShared {
			pending: Mutex::new(VecDeque::new()),
			same_key,
			deliver,
		});
		let timer = spawn_periodic(TaskClass::Background, "update-batcher", window, {
			let shared = Arc::clone(&shared);
			move || {
				let flushed = shared.flush();
				if flushed > 0 {
					trace!(flushed, "batch.flush");
				}
			}
		});
		Self { shared, timer }
	}

	pub fn record(&self, update: T) -> RecordOutcome {
		if self.timer.is_cancelled() {
			return RecordOutcome::Discarded;
		}
		let mut pending = self.shared.pending.lock();
		if let Some(same_key) = self.shared.same_key.as_ref()
			&& let Some(existing) = pending.iter_mut().find(|queued| same_key(queued, &update))
		{
			*existing = update;
			return RecordOutcome::Coalesced;
		}
		pending.push_back(update);
		RecordOutcome::Queued
	}

	/// Delivers everything buffered right now without waiting for the window.
	pub fn flush_now(&self) -> usize {
		self.shared.flush()
	}

	pub fn pending(&self) -> usize {
		self.shared.pending.lock().len()
	}

	/// Stops the timer and drops buffered updates. Returns false if already cancelled.
	pub fn cancel(&self) -> bool {
		if !self.timer.cancel() {
			return false;
		}
		let discarded = std::mem::take(&mut *self.shared.pending.lock()).len();
		debug!(discarded, "batch.cancel");
		true
	}
}
