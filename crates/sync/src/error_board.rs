use std::sync::Arc;

use evfleet_primitives::{ErrorReport, ErrorSink};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

type UnauthorizedHook = Arc<dyn Fn(&ErrorReport) + Send + Sync>;

/// User-facing error surface.
///
/// Holds the most recent report until it is dismissed or replaced. A report
/// with status 401 additionally runs the unauthorized hook, after the report
/// is published.
pub struct ErrorBoard {
	current: watch::Sender<Option<ErrorReport>>,
	on_unauthorized: Mutex<Option<UnauthorizedHook>>,
}

impl Default for ErrorBoard {
	fn default() -> Self {
		Self::new()
	}
}

impl ErrorBoard {
	pub fn new() -> Self {
		let (current, _) = watch::channel(None);
		Self {
			current,
			on_unauthorized: Mutex::new(None),
		}
	}

	pub fn current(&self) -> Option<ErrorReport> {
		self.current.borrow().clone()
	}

	pub fn watch(&self) -> watch::Receiver<Option<ErrorReport>> {
		self.current.subscribe()
	}

	/// Clears the shown report and returns it.
	pub fn dismiss(&self) -> Option<ErrorReport> {
		let dismissed = self.current.send_replace(None);
		if dismissed.is_some() {
			debug!("sync.error_dismissed");
		}
		dismissed
	}

	/// Replaces the hook run for unauthorized reports.
	pub fn on_unauthorized(&self, hook: impl Fn(&ErrorReport) + Send + Sync + 'static) {
		*self.on_unauthorized.lock() = Some(Arc::new(hook));
	}
}

impl ErrorSink for ErrorBoard {
	fn report(&self, report: ErrorReport) {
		warn!(status = ?report.status, name = %report.name, message = %report.message, "sync.error");
		let hook = report.is_unauthorized().then(|| self.on_unauthorized.lock().clone()).flatten();
		self.current.send_replace(Some(report.clone()));
		if let Some(hook) = hook {
			hook(&report);
		}
	}
}

impl std::fmt::Debug for ErrorBoard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ErrorBoard").field("current", &*self.current.borrow()).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests;
