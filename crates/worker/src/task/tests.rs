use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_is_reported_once() {
	let task = OwnedTask::spawn(TaskClass::Background, "idle", |cancel| async move { cancel.cancelled().await });
	assert!(task.cancel());
	assert!(!task.cancel());
	assert!(task.is_cancelled());
	task.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn drop_stops_the_body() {
	let stopped = Arc::new(AtomicUsize::new(0));
	let task = {
		let stopped = Arc::clone(&stopped);
		OwnedTask::spawn(TaskClass::Network, "driver", move |cancel| async move {
			cancel.cancelled().await;
			stopped.fetch_add(1, Ordering::SeqCst);
		})
	};
	tokio::task::yield_now().await;
	assert_eq!(stopped.load(Ordering::SeqCst), 0);
	assert!(!task.is_finished());

	drop(task);
	tokio::time::sleep(std::time::Duration::from_millis(1)).await;
	assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shutdown_waits_for_body() {
	let task = OwnedTask::spawn(TaskClass::Interactive, "short", |_cancel| async {});
	assert_eq!(task.name(), "short");
	task.shutdown().await;
}
