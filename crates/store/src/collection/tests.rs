use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::model::{EvseKey, EvseStatusRecord, Station};
use crate::status::EvseStatus;

fn station(id: u64, name: &str) -> Station {
	Station {
		name: Some(name.to_string()),
		..Station::new(id)
	}
}

#[test]
fn upsert_merges_present_fields_only() {
	let mut stations = EntityCollection::new();
	let mut first = station(1, "Depot");
	first.city = Some("Austin".into());
	assert_eq!(stations.upsert_one(first), Upsert::Inserted);

	let mut patch = Station::new(1);
	patch.name = Some("Depot North".into());
	patch.extra.insert("power".into(), json!(150));
	assert_eq!(stations.upsert_one(patch), Upsert::Merged);

	let stored = stations.select_by_id(&1).unwrap();
	assert_eq!(stored.name.as_deref(), Some("Depot North"));
	assert_eq!(stored.city.as_deref(), Some("Austin"));
	assert_eq!(stored.extra.get("power"), Some(&json!(150)));
	assert_eq!(stations.len(), 1);
}

#[test]
fn upsert_many_counts_new_records() {
	let mut stations = EntityCollection::new();
	stations.upsert_one(station(1, "a"));
	let inserted = stations.upsert_many([station(1, "b"), station(2, "c"), station(3, "d")]);
	assert_eq!(inserted, 2);
	assert_eq!(stations.len(), 3);
	assert_eq!(stations.select_by_id(&1).unwrap().name.as_deref(), Some("b"));
}

#[test]
fn set_one_replaces_wholesale() {
	let mut stations = EntityCollection::new();
	let mut first = station(1, "Depot");
	first.city = Some("Austin".into());
	stations.set_one(first);
	stations.set_one(Station::new(1));
	assert_eq!(stations.select_by_id(&1).unwrap().city, None);
}

#[test]
fn update_of_missing_record_is_a_no_op() {
	let mut stations: EntityCollection<Station> = EntityCollection::new();
	assert!(!stations.update_by_id(&7, station(7, "ghost")));
	assert!(stations.is_empty());
}

#[test]
fn update_ignores_key_fields_of_changes() {
	let mut stations = EntityCollection::new();
	stations.upsert_one(station(1, "Depot"));
	assert!(stations.update_by_id(&1, station(99, "Renamed")));
	assert_eq!(stations.ids(), vec![1]);
	assert_eq!(stations.select_by_id(&1).unwrap().name.as_deref(), Some("Renamed"));
}

#[test]
fn select_all_uses_presentation_order() {
	let mut stations = EntityCollection::new();
	let mut late = station(1, "late");
	late.created_at = Some("2024-03-01T00:00:00Z".parse().unwrap());
	let mut early = station(2, "early");
	early.created_at = Some("2024-01-01T00:00:00Z".parse().unwrap());
	stations.upsert_many([late, early]);
	assert_eq!(stations.ids(), vec![2, 1]);
}

#[test]
fn select_with_fields_requires_all_truthy() {
	let mut stations = EntityCollection::new();
	let mut placed = station(1, "placed");
	placed.latitude = Some(30.2);
	placed.longitude = Some(-97.7);
	let mut zeroed = station(2, "zeroed");
	zeroed.latitude = Some(0.0);
	zeroed.longitude = Some(-97.7);
	stations.upsert_many([placed, zeroed, station(3, "unplaced")]);

	let ids: Vec<u64> = stations.select_with_fields(&["latitude", "longitude"]).into_iter().map(|s| s.id).collect();
	assert_eq!(ids, vec![1]);
}

#[test]
fn select_by_parent_is_scoped_to_one_station() {
	let mut statuses = EntityCollection::new();
	statuses.upsert_many([
		EvseStatusRecord::new(EvseKey::new(1, 2), EvseStatus::Occupied),
		EvseStatusRecord::new(EvseKey::new(1, 1), EvseStatus::Available),
		EvseStatusRecord::new(EvseKey::new(2, 1), EvseStatus::Faulted),
	]);

	let keys: Vec<EvseKey> = statuses.select_by_parent(&1).into_iter().map(Entity::key).collect();
	assert_eq!(keys, vec![EvseKey::new(1, 1), EvseKey::new(1, 2)]);
	assert_eq!(statuses.remove_under(&1), 2);
	assert_eq!(statuses.len(), 1);
	assert!(statuses.contains(&EvseKey::new(2, 1)));
}

#[test]
fn remove_many_reports_existing_only() {
	let mut stations: EntityCollection<Station> = [station(1, "a"), station(2, "b")].into_iter().collect();
	assert_eq!(stations.remove_many(&[1, 5]), 1);
	assert_eq!(stations.remove_by_id(&2).map(|s| s.id), Some(2));
	assert!(stations.is_empty());
}
