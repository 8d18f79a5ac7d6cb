use super::*;

#[test]
fn aggregate_prefers_available() {
	let statuses = [EvseStatus::Faulted, EvseStatus::Available, EvseStatus::Occupied];
	assert_eq!(EvseStatus::aggregate(statuses), EvseStatus::Available);
}

#[test]
fn aggregate_follows_priority_order() {
	assert_eq!(EvseStatus::aggregate([EvseStatus::Unavailable, EvseStatus::Reserved]), EvseStatus::Reserved);
	assert_eq!(EvseStatus::aggregate([EvseStatus::Unavailable, EvseStatus::Faulted]), EvseStatus::Faulted);
}

#[test]
fn aggregate_without_data_is_unknown() {
	assert_eq!(EvseStatus::aggregate([]), EvseStatus::Unknown);
	assert_eq!(EvseStatus::aggregate([EvseStatus::Unknown]), EvseStatus::Unknown);
}

#[test]
fn unrecognized_wire_status_is_unknown() {
	let parsed: EvseStatus = serde_json::from_str(r#""Charging""#).unwrap();
	assert_eq!(parsed, EvseStatus::Unknown);
	assert_eq!(EvseStatus::parse("Occupied"), EvseStatus::Occupied);
	assert_eq!(EvseStatus::parse("occupied"), EvseStatus::Unknown);
}
