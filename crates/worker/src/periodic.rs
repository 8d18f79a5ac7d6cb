use std::time::Duration;

use crate::{OwnedTask, TaskClass};

/// Runs `tick` every `period` until the returned task is cancelled or dropped.
///
/// The timer is re-armed only after `tick` returns, so a slow tick delays the
/// next one instead of overlapping it. The first tick fires one full period
/// after spawning.
pub fn spawn_periodic<F>(class: TaskClass, name: impl Into<String>, period: Duration, mut tick: F) -> OwnedTask
where
	F: FnMut() + Send + 'static,
{
	let name = name.into();
	let label = name.clone();
	OwnedTask::spawn(class, name, move |cancel| async move {
		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				_ = tokio::time::sleep(period) => {
					tracing::trace!(task = %label, "worker.periodic.tick");
					tick();
				}
			}
		}
	})
}
