use pretty_assertions::assert_eq;

use super::*;

#[test]
fn envelope_reads_next_token() {
	let env: CursorEnvelope = serde_json::from_str(r#"{"next":"abc"}"#).unwrap();
	assert_eq!(env.next.as_ref().map(Cursor::as_str), Some("abc"));
	assert!(env.has_more());
}

#[test]
fn envelope_treats_null_missing_and_empty_as_exhausted() {
	for raw in [r#"{"next":null}"#, "{}", r#"{"next":""}"#] {
		let env: CursorEnvelope = serde_json::from_str(raw).unwrap();
		assert_eq!(env, CursorEnvelope::exhausted(), "input: {raw}");
	}
}

#[test]
fn empty_cursor_is_none() {
	assert_eq!(Cursor::new(""), None);
	assert_eq!(Cursor::new("x").map(|c| c.to_string()), Some("x".to_string()));
}
