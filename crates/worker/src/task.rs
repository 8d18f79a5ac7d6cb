use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{TaskClass, spawn};

/// A spawned task that is cancelled when its owner lets go of it.
///
/// Cancellation is cooperative: the task body receives a [`CancellationToken`]
/// and is expected to select on it. Cancelling twice is a no-op, so timers owned
/// by a dropped component are torn down exactly once.
#[derive(Debug)]
pub struct OwnedTask {
	name: String,
	cancel: CancellationToken,
	join: Option<JoinHandle<()>>,
}

impl OwnedTask {
	/// Spawns `body` with a fresh cancellation token.
	pub fn spawn<F, Fut>(class: TaskClass, name: impl Into<String>, body: F) -> Self
	where
		F: FnOnce(CancellationToken) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let name = name.into();
		let cancel = CancellationToken::new();
		tracing::debug!(task = %name, worker_class = class.as_str(), "worker.task.start");
		let join = spawn(class, body(cancel.clone()));
		Self {
			name,
			cancel,
			join: Some(join),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Requests cancellation. Returns false when it was already requested.
	pub fn cancel(&self) -> bool {
		if self.cancel.is_cancelled() {
			return false;
		}
		self.cancel.cancel();
		tracing::debug!(task = %self.name, "worker.task.cancel");
		true
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Returns true once the task body has returned.
	pub fn is_finished(&self) -> bool {
		self.join.as_ref().is_none_or(JoinHandle::is_finished)
	}

	/// Cancels the task and waits for its body to return.
	pub async fn shutdown(mut self) {
		self.cancel();
		if let Some(join) = self.join.take()
			&& let Err(err) = join.await
		{
			tracing::warn!(task = %self.name, error = %err, "worker.task.join_failed");
		}
	}
}

impl Drop for OwnedTask {
	fn drop(&mut self) {
		self.cancel();
	}
}

#[cfg(test)]
mod tests;
