use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use evfleet_primitives::UNKNOWN_ERROR_MESSAGE;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn latest_report_is_shown_until_dismissed() {
	let board = ErrorBoard::new();
	let mut seen = board.watch();

	board.report(ErrorReport::new(Some(500), "Internal Server Error", ""));
	board.report(ErrorReport::new(None, "NetworkError", "connection refused"));

	assert!(seen.has_changed().unwrap());
	assert_eq!(board.current(), Some(ErrorReport::new(None, "NetworkError", "connection refused")));
	assert_eq!(board.dismiss().map(|r| r.name), Some("NetworkError".to_string()));
	assert_eq!(board.current(), None);
	assert_eq!(board.dismiss(), None);
}

#[test]
fn empty_message_falls_back() {
	let board = ErrorBoard::new();
	board.report(ErrorReport::new(Some(404), "Not Found", ""));
	assert_eq!(board.current().unwrap().message, UNKNOWN_ERROR_MESSAGE);
}

#[test]
fn only_unauthorized_reports_run_the_hook() {
	let board = Arc::new(ErrorBoard::new());
	let runs = Arc::new(AtomicUsize::new(0));
	board.on_unauthorized({
		let runs = Arc::clone(&runs);
		move |report| {
			assert_eq!(report.status, Some(401));
			runs.fetch_add(1, Ordering::SeqCst);
		}
	});

	board.report(ErrorReport::new(Some(403), "Forbidden", "no"));
	assert_eq!(runs.load(Ordering::SeqCst), 0);

	board.report(ErrorReport::new(Some(401), "Unauthorized", "expired"));
	assert_eq!(runs.load(Ordering::SeqCst), 1);
	assert_eq!(board.current().unwrap().status, Some(401));
}

#[test]
fn hook_may_read_the_board() {
	let board = Arc::new(ErrorBoard::new());
	let shown = Arc::new(parking_lot::Mutex::new(None));
	board.on_unauthorized({
		let board = Arc::downgrade(&board);
		let shown = Arc::clone(&shown);
		move |_| *shown.lock() = board.upgrade().and_then(|b| b.current())
	});

	board.report(ErrorReport::new(Some(401), "Unauthorized", "expired"));
	assert_eq!(shown.lock().as_ref().map(|r| r.name.as_str()), Some("Unauthorized"));
}
