//! One fetch call site: gating, deduplication and single-flight execution.

use std::future::Future;
use std::sync::{Arc, Weak};

use evfleet_primitives::{BoxFutureStatic, SharedErrorSink};
use evfleet_worker::{OwnedTask, TaskClass};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::load_state::LoadState;

type FetchAction<T> = Box<dyn FnOnce() -> BoxFutureStatic<Result<T>> + Send>;
type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Gate and identity of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	/// When false the invocation is a no-op and load state is left alone.
	pub condition: bool,
	/// Invocations whose key equals the last successful one are suppressed.
	pub dedupe_key: String,
}

impl FetchRequest {
	pub fn new(dedupe_key: impl Into<String>) -> Self {
		Self {
			condition: true,
			dedupe_key: dedupe_key.into(),
		}
	}

	pub fn when(mut self, condition: bool) -> Self {
		self.condition = condition;
		self
	}
}

/// What an invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	/// The condition was false, or the site does not fire on mount.
	Skipped,
	/// Same key as the last success or the fetch in flight.
	Deduplicated,
	/// A fetch is in flight; this one runs after it settles.
	Queued,
	Started,
	/// Refused because a fetch is in flight.
	Busy,
}

struct SiteInner<T> {
	fire_on_mount: bool,
	on_success: Option<SuccessHook<T>>,
	last_key: Option<String>,
	in_flight: Option<String>,
	queued: Option<(String, FetchAction<T>)>,
	data: Option<T>,
	task: Option<OwnedTask>,
}

struct SiteShared<T> {
	name: String,
	errors: SharedErrorSink,
	state: watch::Sender<LoadState>,
	inner: Mutex<SiteInner<T>>,
}

/// A fetch call site.
///
/// At most one fetch runs at a time. An invocation with a different key while
/// one is in flight replaces any earlier queued invocation and runs once the
/// current one settles. Failures go to the error sink and reset the site to
/// [`LoadState::Idle`]; they are never returned to the caller.
///
/// Dropping the site cancels the fetch in flight.
pub struct FetchSite<T> {
	shared: Arc<SiteShared<T>>,
}

impl<T> FetchSite<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new(name: impl Into<String>, errors: SharedErrorSink) -> Self {
		let (state, _) = watch::channel(LoadState::Idle);
		Self {
			shared: Arc::new(SiteShared {
				name: name.into(),
				errors,
				state,
				inner: Mutex::new(SiteInner {
					fire_on_mount: true,
					on_success: None,
					last_key: None,
					in_flight: None,
					queued: None,
					data: None,
					task: None,
				}),
			}),
		}
	}

	/// Makes [`FetchSite::mount`] a no-op; only explicit runs fetch.
	pub fn deferred(self) -> Self {
		self.shared.inner.lock().fire_on_mount = false;
		self
	}

	/// Called with every successful result, outside the site's lock.
	pub fn on_success(self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
		self.shared.inner.lock().on_success = Some(Arc::new(hook));
		self
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	pub fn load_state(&self) -> LoadState {
		*self.shared.state.borrow()
	}

	pub fn watch_state(&self) -> watch::Receiver<LoadState> {
		self.shared.state.subscribe()
	}

	/// Latest successful result.
	pub fn data(&self) -> Option<T> {
		self.shared.inner.lock().data.clone()
	}

	/// Key of the last successful fetch.
	pub fn last_key(&self) -> Option<String> {
		self.shared.inner.lock().last_key.clone()
	}

	/// First invocation from the host. Fires only unless the site is [deferred](FetchSite::deferred).
	pub fn mount<F, Fut>(&self, request: FetchRequest, action: F) -> RunOutcome
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		if !self.shared.inner.lock().fire_on_mount {
			trace!(site = %self.shared.name, "fetch.mount_deferred");
			return RunOutcome::Skipped;
		}
		self.run(request, action)
	}

	/// Re-evaluates the site against `request`.
	pub fn run<F, Fut>(&self, request: FetchRequest, action: F) -> RunOutcome
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		if !request.condition {
			return RunOutcome::Skipped;
		}
		let action: FetchAction<T> = Box::new(move || Box::pin(action()));
		let key = request.dedupe_key;
		let mut inner = self.shared.inner.lock();
		let in_flight = inner.in_flight.clone();
		let outcome = match in_flight.as_deref() {
			Some(current) if current == key => {
				inner.queued = None;
				RunOutcome::Deduplicated
			}
			Some(_) => {
				inner.queued = Some((key.clone(), action));
				RunOutcome::Queued
			}
			None if inner.last_key.as_deref() == Some(key.as_str()) => RunOutcome::Deduplicated,
			None => {
				SiteShared::start(&self.shared, &mut inner, key.clone(), action);
				RunOutcome::Started
			}
		};
		debug!(site = %self.shared.name, key = %key, ?outcome, "fetch.run");
		outcome
	}

	/// Like [`FetchSite::run`], but refuses instead of queueing while a fetch is in flight.
	pub fn run_if_idle<F, Fut>(&self, request: FetchRequest, action: F) -> RunOutcome
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		if self.shared.inner.lock().in_flight.is_some() {
			trace!(site = %self.shared.name, "fetch.busy");
			return RunOutcome::Busy;
		}
		self.run(request, action)
	}

	/// Forgets the last successful key so the next run fetches even if unchanged.
	pub fn invalidate(&self) {
		self.shared.inner.lock().last_key = None;
	}

	/// Cancels the fetch in flight and drops any queued one.
	pub fn cancel(&self) {
		let task = {
			let mut inner = self.shared.inner.lock();
			inner.queued = None;
			inner.in_flight = None;
			inner.task.take()
		};
		if let Some(task) = task {
			task.cancel();
			self.shared.state.send_if_modified(|state| {
				let modified = state.is_loading();
				if modified {
					*state = LoadState::Idle;
				}
				modified
			});
		}
	}

	/// Resolves once no fetch is in flight or queued.
	pub async fn settled(&self) {
		let mut state = self.shared.state.subscribe();
		let _ = state.wait_for(|s| !s.is_loading()).await;
	}
}

impl<T> SiteShared<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn start(shared: &Arc<Self>, inner: &mut SiteInner<T>, key: String, action: FetchAction<T>) {
		inner.in_flight = Some(key);
		shared.state.send_replace(LoadState::Loading);
		let weak: Weak<Self> = Arc::downgrade(shared);
		inner.task = Some(OwnedTask::spawn(TaskClass::Network, format!("fetch:{}", shared.name), move |cancel| async move {
			let result = tokio::select! {
				biased;
				_ = cancel.cancelled() => return,
				result = action() => result,
			};
			if cancel.is_cancelled() {
				return;
			}
			if let Some(shared) = weak.upgrade() {
				Self::settle(&shared, result);
			}
		}));
	}

	fn settle(shared: &Arc<Self>, result: Result<T>) {
		let mut inner = shared.inner.lock();
		let key = inner.in_flight.take();
		let (delivered, report) = match result {
			Ok(data) => {
				inner.last_key = key;
				inner.data = Some(data.clone());
				shared.state.send_replace(LoadState::Done);
				(inner.on_success.clone().map(|hook| (hook, data)), None)
			}
			Err(err) => {
				shared.state.send_replace(LoadState::Idle);
				warn!(site = %shared.name, key = ?key, error = %err, "fetch.failed");
				(None, Some(err.to_report()))
			}
		};
		if let Some((key, action)) = inner.queued.take() {
			if inner.last_key.as_deref() == Some(key.as_str()) {
				debug!(site = %shared.name, key = %key, "fetch.queued_deduplicated");
			} else {
				Self::start(shared, &mut inner, key, action);
			}
		}
		drop(inner);
		if let Some(report) = report {
			shared.errors.report(report);
		}
		if let Some((hook, data)) = delivered {
			hook(&data);
		}
	}
}

#[cfg(test)]
mod tests;
