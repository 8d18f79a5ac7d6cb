use std::sync::Mutex;

use super::*;

#[test]
fn empty_message_falls_back_to_generic_text() {
	let report = ErrorReport::new(Some(500), "Internal Server Error", "");
	assert_eq!(report.message, UNKNOWN_ERROR_MESSAGE);
	assert!(!report.is_unauthorized());
}

#[test]
fn unauthorized_is_detected_from_status() {
	assert!(ErrorReport::new(Some(401), "Unauthorized", "token expired").is_unauthorized());
	assert!(!ErrorReport::new(None, "NetworkError", "offline").is_unauthorized());
}

#[test]
fn closures_act_as_sinks() {
	let seen = Mutex::new(Vec::new());
	let sink = |report: ErrorReport| seen.lock().unwrap().push(report.name);
	sink.report(ErrorReport::new(None, "A", "a"));
	NoOpErrorSink.report(ErrorReport::new(None, "B", "b"));
	assert_eq!(*seen.lock().unwrap(), vec!["A".to_string()]);
}
