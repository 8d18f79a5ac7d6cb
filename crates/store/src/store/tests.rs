use pretty_assertions::assert_eq;

use super::*;

fn status(station: u64, evse: u64, status: EvseStatus) -> EvseStatusRecord {
	EvseStatusRecord::new(EvseKey::new(station, evse), status)
}

#[test]
fn station_status_picks_highest_priority() {
	let mut store = EntityStore::new();
	store.evse_statuses_mut().upsert_many([
		status(1, 1, EvseStatus::Faulted),
		status(1, 2, EvseStatus::Occupied),
		status(2, 1, EvseStatus::Available),
	]);
	assert_eq!(store.station_status(1), EvseStatus::Occupied);
	assert_eq!(store.station_status(2), EvseStatus::Available);
	assert_eq!(store.station_status(3), EvseStatus::Unknown);
}

#[test]
fn later_status_overwrites_earlier() {
	let mut store = EntityStore::new();
	store.evse_statuses_mut().upsert_one(status(1, 1, EvseStatus::Available));
	store.evse_statuses_mut().upsert_one(status(1, 1, EvseStatus::Faulted));
	assert_eq!(store.evse_status(&EvseKey::new(1, 1)), EvseStatus::Faulted);
}

#[test]
fn evses_join_their_status() {
	let mut store = EntityStore::new();
	store.evses_mut().upsert_many([Evse::new(EvseKey::new(4, 1)), Evse::new(EvseKey::new(4, 2))]);
	store.evse_statuses_mut().upsert_one(status(4, 2, EvseStatus::Reserved));

	let joined: Vec<(u64, EvseStatus)> = store.evses_with_status(4).into_iter().map(|(e, s)| (e.evse_id, s)).collect();
	assert_eq!(joined, vec![(1, EvseStatus::Unknown), (2, EvseStatus::Reserved)]);
}

#[test]
fn status_keys_cover_both_collections() {
	let mut store = EntityStore::new();
	store.evses_mut().upsert_one(Evse::new(EvseKey::new(4, 1)));
	store.evse_statuses_mut().upsert_many([status(4, 1, EvseStatus::Available), status(4, 3, EvseStatus::Available), status(5, 1, EvseStatus::Available)]);
	assert_eq!(store.status_keys_for_station(4), vec![EvseKey::new(4, 1), EvseKey::new(4, 3)]);
}

#[test]
fn station_mutations_refresh_filters() {
	let mut store = EntityStore::new();
	store.update_stations(|c| {
		c.upsert_one(Station {
			city: Some("Austin".into()),
			..Station::new(1)
		})
	});
	assert_eq!(store.station_filters().city.options(), ["All", "Austin"]);

	store.update_stations(|c| c.remove_by_id(&1));
	assert_eq!(store.station_filters().city.options(), ["All"]);
}

#[test]
fn filtered_stations_apply_selection() {
	let mut store = EntityStore::new();
	store.update_stations(|c| {
		c.upsert_many([
			Station {
				city: Some("Austin".into()),
				..Station::new(1)
			},
			Station {
				city: Some("Dallas".into()),
				..Station::new(2)
			},
		])
	});
	assert!(store.station_filters_mut().city.set_selected("Dallas"));
	let ids: Vec<u64> = store.filtered_stations().into_iter().map(|s| s.id).collect();
	assert_eq!(ids, vec![2]);
}

#[test]
fn handle_shares_one_store() {
	let handle = StoreHandle::new();
	let other = handle.clone();
	handle.write(|s| s.users_mut().upsert_one(User { id: 9, ..User::default() }));
	assert_eq!(other.read(|s| s.users().len()), 1);
	other.write(EntityStore::clear);
	assert!(handle.read(|s| s.users().is_empty()));
}
