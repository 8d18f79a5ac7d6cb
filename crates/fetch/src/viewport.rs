use std::future::Future;

use evfleet_primitives::{MapView, SharedErrorSink, ViewportKey};
use tokio::sync::watch;

use crate::error::Result;
use crate::load_state::LoadState;
use crate::site::{FetchRequest, FetchSite, RunOutcome};

/// Decimal places kept when keying a viewport.
pub const DEFAULT_VIEWPORT_PRECISION: u32 = 4;

/// Fetches once per distinct rounded map viewport.
///
/// Continuous pan and zoom events that round to the same center and zoom
/// share one key and therefore one request.
pub struct ViewportFetch<T> {
	site: FetchSite<T>,
	precision: u32,
}

impl<T> ViewportFetch<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new(name: impl Into<String>, precision: u32, errors: SharedErrorSink) -> Self {
		Self {
			site: FetchSite::new(name, errors),
			precision,
		}
	}

	pub fn key_for(&self, view: &MapView) -> ViewportKey {
		view.viewport_key(self.precision)
	}

	pub fn load_state(&self) -> LoadState {
		self.site.load_state()
	}

	pub fn watch_state(&self) -> watch::Receiver<LoadState> {
		self.site.watch_state()
	}

	pub fn data(&self) -> Option<T> {
		self.site.data()
	}

	/// Handles one viewport change. Nothing happens without a view.
	pub fn on_view<F, Fut>(&self, view: Option<&MapView>, condition: bool, action: F) -> RunOutcome
	where
		F: FnOnce(MapView) -> Fut + Send + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let Some(view) = view.copied() else {
			return RunOutcome::Skipped;
		};
		let key = self.key_for(&view);
		self.site.run(FetchRequest::new(key).when(condition), move || action(view))
	}

	pub fn cancel(&self) {
		self.site.cancel();
	}

	pub async fn settled(&self) {
		self.site.settled().await;
	}
}
