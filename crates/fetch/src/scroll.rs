use std::future::Future;
use std::sync::Arc;

use evfleet_primitives::{Cursor, CursorEnvelope, SharedErrorSink};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::error::Result;
use crate::load_state::LoadState;
use crate::site::{FetchRequest, FetchSite, RunOutcome};

/// Results that carry a continuation cursor.
pub trait Paginated {
	fn cursor(&self) -> &CursorEnvelope;
}

impl Paginated for CursorEnvelope {
	fn cursor(&self) -> &CursorEnvelope {
		self
	}
}

/// Scroll position of a list, in any consistent unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
	/// Distance scrolled from the top.
	pub offset: f64,
	/// Visible height.
	pub viewport: f64,
	/// Total scrollable height.
	pub extent: f64,
}

impl ScrollMetrics {
	pub const fn new(offset: f64, viewport: f64, extent: f64) -> Self {
		Self { offset, viewport, extent }
	}

	/// True once the visible window, extended by `lookahead`, reaches the end.
	pub fn near_bottom(&self, lookahead: f64) -> bool {
		self.offset + self.viewport + lookahead >= self.extent
	}
}

#[derive(Debug, Clone, Default)]
struct ScrollPosition {
	cursor: CursorEnvelope,
	page: u32,
}

/// Fetches the next page when a list is scrolled near its end.
///
/// Never fires on mount. A request is only made when a cursor is present and
/// no page request is in flight, so bursts of scroll events produce at most
/// one request.
pub struct ScrollFetch<P> {
	site: FetchSite<P>,
	lookahead: f64,
	position: Arc<Mutex<ScrollPosition>>,
}

impl<P> ScrollFetch<P>
where
	P: Paginated + Clone + Send + Sync + 'static,
{
	pub fn new(name: impl Into<String>, lookahead: f64, errors: SharedErrorSink) -> Self {
		let position = Arc::new(Mutex::new(ScrollPosition::default()));
		let advance = position.clone();
		let site = FetchSite::new(name, errors).deferred().on_success(move |page: &P| {
			let mut position = advance.lock();
			position.cursor = page.cursor().clone();
			position.page += 1;
		});
		Self { site, lookahead, position }
	}

	/// Restarts pagination from the first page of a fresh list fetch.
	///
	/// A page request of the previous list still in flight is cancelled.
	pub fn reset(&self, cursor: CursorEnvelope) {
		self.site.cancel();
		*self.position.lock() = ScrollPosition { cursor, page: 1 };
		self.site.invalidate();
	}

	pub fn cursor(&self) -> CursorEnvelope {
		self.position.lock().cursor.clone()
	}

	/// Pages loaded since the last [`ScrollFetch::reset`], counting the first.
	pub fn page(&self) -> u32 {
		self.position.lock().page
	}

	pub fn has_more(&self) -> bool {
		self.position.lock().cursor.has_more()
	}

	pub fn load_state(&self) -> LoadState {
		self.site.load_state()
	}

	pub fn watch_state(&self) -> watch::Receiver<LoadState> {
		self.site.watch_state()
	}

	pub fn data(&self) -> Option<P> {
		self.site.data()
	}

	/// Handles one scroll event. `action` receives the cursor of the page to load.
	pub fn on_scroll<F, Fut>(&self, metrics: ScrollMetrics, action: F) -> RunOutcome
	where
		F: FnOnce(Cursor) -> Fut + Send + 'static,
		Fut: Future<Output = Result<P>> + Send + 'static,
	{
		if !metrics.near_bottom(self.lookahead) {
			return RunOutcome::Skipped;
		}
		let Some(cursor) = self.position.lock().cursor.next.clone() else {
			trace!(site = %self.site.name(), "fetch.scroll_exhausted");
			return RunOutcome::Skipped;
		};
		let key = cursor.to_string();
		self.site.run_if_idle(FetchRequest::new(key), move || action(cursor))
	}

	pub fn cancel(&self) {
		self.site.cancel();
	}

	pub async fn settled(&self) {
		self.site.settled().await;
	}
}
