use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use evfleet_primitives::ErrorReport;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

use super::*;
use crate::error::FetchError;

type Calls = Arc<Mutex<Vec<String>>>;

async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

fn reports() -> (SharedErrorSink, Arc<Mutex<Vec<ErrorReport>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	(Arc::new(move |report: ErrorReport| sink.lock().push(report)), seen)
}

/// An action that records its key and resolves when the returned sender fires.
fn gated(calls: &Calls, key: &str) -> (oneshot::Sender<Result<u32>>, impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> + Send + 'static) {
	let (tx, rx) = oneshot::channel();
	let calls = calls.clone();
	let key = key.to_string();
	let action = move || -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> {
		Box::pin(async move {
			calls.lock().push(key);
			rx.await.unwrap_or_else(|_| Err(FetchError::Network("dropped".into())))
		})
	};
	(tx, action)
}

fn ready(calls: &Calls, key: &str, value: u32) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> + Send + 'static {
	let calls = calls.clone();
	let key = key.to_string();
	move || -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> {
		Box::pin(async move {
			calls.lock().push(key);
			Ok(value)
		})
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn false_condition_leaves_state_alone() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	let outcome = site.run(FetchRequest::new("a").when(false), ready(&calls, "a", 1));
	settle().await;

	assert_eq!(outcome, RunOutcome::Skipped);
	assert_eq!(site.load_state(), LoadState::Idle);
	assert!(calls.lock().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unchanged_key_is_deduplicated_after_success() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	assert_eq!(site.run(FetchRequest::new("a"), ready(&calls, "a", 1)), RunOutcome::Started);
	assert_eq!(site.load_state(), LoadState::Loading);
	site.settled().await;
	assert_eq!(site.load_state(), LoadState::Done);
	assert_eq!(site.data(), Some(1));

	assert_eq!(site.run(FetchRequest::new("a"), ready(&calls, "a", 2)), RunOutcome::Deduplicated);
	assert_eq!(site.run(FetchRequest::new("b"), ready(&calls, "b", 3)), RunOutcome::Started);
	site.settled().await;

	assert_eq!(*calls.lock(), vec!["a".to_string(), "b".to_string()]);
	assert_eq!(site.data(), Some(3));
	assert_eq!(site.last_key().as_deref(), Some("b"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn overlapping_runs_collapse_to_the_latest() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	let (release, first) = gated(&calls, "a");
	assert_eq!(site.run(FetchRequest::new("a"), first), RunOutcome::Started);
	settle().await;
	assert_eq!(site.run(FetchRequest::new("b"), ready(&calls, "b", 2)), RunOutcome::Queued);
	assert_eq!(site.run(FetchRequest::new("c"), ready(&calls, "c", 3)), RunOutcome::Queued);
	assert_eq!(*calls.lock(), vec!["a".to_string()]);

	release.send(Ok(1)).unwrap();
	site.settled().await;

	assert_eq!(*calls.lock(), vec!["a".to_string(), "c".to_string()]);
	assert_eq!(site.data(), Some(3));
	assert_eq!(site.load_state(), LoadState::Done);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn returning_to_the_in_flight_key_drops_the_queue() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("viewport", errors);

	let (release, first) = gated(&calls, "a");
	site.run(FetchRequest::new("a"), first);
	settle().await;
	assert_eq!(site.run(FetchRequest::new("b"), ready(&calls, "b", 2)), RunOutcome::Queued);
	assert_eq!(site.run(FetchRequest::new("a"), ready(&calls, "a", 9)), RunOutcome::Deduplicated);

	release.send(Ok(1)).unwrap();
	site.settled().await;
	assert_eq!(*calls.lock(), vec!["a".to_string()]);
	assert_eq!(site.data(), Some(1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failure_reports_and_allows_retry() {
	let (errors, seen) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	let (release, first) = gated(&calls, "a");
	site.run(FetchRequest::new("a"), first);
	settle().await;
	release
		.send(Err(FetchError::Http {
			status: 500,
			name: "Internal Server Error".into(),
			message: String::new(),
		}))
		.unwrap();
	site.settled().await;

	assert_eq!(site.load_state(), LoadState::Idle);
	assert_eq!(site.data(), None);
	assert_eq!(*seen.lock(), vec![ErrorReport::new(Some(500), "Internal Server Error", "")]);
	assert_eq!(seen.lock()[0].message, evfleet_primitives::UNKNOWN_ERROR_MESSAGE);

	assert_eq!(site.run(FetchRequest::new("a"), ready(&calls, "a", 1)), RunOutcome::Started);
	site.settled().await;
	assert_eq!(site.load_state(), LoadState::Done);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn deferred_site_ignores_mount() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("scroll", errors).deferred();

	assert_eq!(site.mount(FetchRequest::new("a"), ready(&calls, "a", 1)), RunOutcome::Skipped);
	settle().await;
	assert!(calls.lock().is_empty());
	assert_eq!(site.run(FetchRequest::new("a"), ready(&calls, "a", 1)), RunOutcome::Started);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn run_if_idle_refuses_while_loading() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("scroll", errors);

	let (release, first) = gated(&calls, "a");
	site.run(FetchRequest::new("a"), first);
	assert_eq!(site.run_if_idle(FetchRequest::new("b"), ready(&calls, "b", 2)), RunOutcome::Busy);
	release.send(Ok(1)).unwrap();
	site.settled().await;
	assert_eq!(*calls.lock(), vec!["a".to_string()]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn success_hook_sees_each_result() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let site = FetchSite::new("stations", errors).on_success(move |value: &u32| sink.lock().push(*value));

	site.run(FetchRequest::new("a"), ready(&calls, "a", 4));
	site.settled().await;
	site.run(FetchRequest::new("b"), ready(&calls, "b", 5));
	site.settled().await;
	assert_eq!(*seen.lock(), vec![4, 5]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dropping_the_site_cancels_the_fetch() {
	let (errors, _) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	let (release, first) = gated(&calls, "a");
	site.run(FetchRequest::new("a"), first);
	settle().await;
	assert!(!release.is_closed());

	drop(site);
	settle().await;
	assert!(release.is_closed());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_returns_to_idle() {
	let (errors, seen) = reports();
	let calls = Calls::default();
	let site = FetchSite::new("stations", errors);

	let (release, first) = gated(&calls, "a");
	site.run(FetchRequest::new("a"), first);
	site.run(FetchRequest::new("b"), ready(&calls, "b", 2));
	settle().await;
	site.cancel();
	settle().await;

	assert_eq!(site.load_state(), LoadState::Idle);
	assert!(release.is_closed());
	assert!(seen.lock().is_empty());
	assert_eq!(*calls.lock(), vec!["a".to_string()]);
}
