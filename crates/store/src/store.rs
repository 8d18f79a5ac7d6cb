use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::collection::EntityCollection;
use crate::filters::LocationFilters;
use crate::model::{Evse, EvseKey, EvseStatusRecord, Site, Station, StationEvent, User};
use crate::status::EvseStatus;

/// Every entity collection of the client, plus the indices derived from them.
///
/// Location filters are recomputed whenever stations or sites are mutated
/// through [`EntityStore::update_stations`] and [`EntityStore::update_sites`].
#[derive(Debug, Default)]
pub struct EntityStore {
	stations: EntityCollection<Station>,
	sites: EntityCollection<Site>,
	evses: EntityCollection<Evse>,
	evse_statuses: EntityCollection<EvseStatusRecord>,
	events: EntityCollection<StationEvent>,
	users: EntityCollection<User>,
	station_filters: LocationFilters,
	site_filters: LocationFilters,
}

impl EntityStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn stations(&self) -> &EntityCollection<Station> {
		&self.stations
	}

	pub fn sites(&self) -> &EntityCollection<Site> {
		&self.sites
	}

	pub fn evses(&self) -> &EntityCollection<Evse> {
		&self.evses
	}

	pub fn evse_statuses(&self) -> &EntityCollection<EvseStatusRecord> {
		&self.evse_statuses
	}

	pub fn events(&self) -> &EntityCollection<StationEvent> {
		&self.events
	}

	pub fn users(&self) -> &EntityCollection<User> {
		&self.users
	}

	pub fn station_filters(&self) -> &LocationFilters {
		&self.station_filters
	}

	pub fn site_filters(&self) -> &LocationFilters {
		&self.site_filters
	}

	pub fn station_filters_mut(&mut self) -> &mut LocationFilters {
		&mut self.station_filters
	}

	pub fn site_filters_mut(&mut self) -> &mut LocationFilters {
		&mut self.site_filters
	}

	/// Mutates the station collection and refreshes its location filters.
	pub fn update_stations<R>(&mut self, f: impl FnOnce(&mut EntityCollection<Station>) -> R) -> R {
		let out = f(&mut self.stations);
		self.station_filters.refresh(self.stations.iter());
		out
	}

	/// Mutates the site collection and refreshes its location filters.
	pub fn update_sites<R>(&mut self, f: impl FnOnce(&mut EntityCollection<Site>) -> R) -> R {
		let out = f(&mut self.sites);
		self.site_filters.refresh(self.sites.iter());
		out
	}

	pub fn evses_mut(&mut self) -> &mut EntityCollection<Evse> {
		&mut self.evses
	}

	pub fn evse_statuses_mut(&mut self) -> &mut EntityCollection<EvseStatusRecord> {
		&mut self.evse_statuses
	}

	pub fn events_mut(&mut self) -> &mut EntityCollection<StationEvent> {
		&mut self.events
	}

	pub fn users_mut(&mut self) -> &mut EntityCollection<User> {
		&mut self.users
	}

	/// Status of one sub-unit, [`EvseStatus::Unknown`] when nothing was reported.
	pub fn evse_status(&self, key: &EvseKey) -> EvseStatus {
		self.evse_statuses.select_by_id(key).and_then(|r| r.status).unwrap_or(EvseStatus::Unknown)
	}

	/// Summary status of a station over its sub-unit statuses.
	pub fn station_status(&self, station_id: u64) -> EvseStatus {
		EvseStatus::aggregate(self.evse_statuses.select_by_parent(&station_id).into_iter().filter_map(|r| r.status))
	}

	/// Sub-units of a station joined with their status.
	pub fn evses_with_status(&self, station_id: u64) -> Vec<(&Evse, EvseStatus)> {
		self.evses.select_by_parent(&station_id).into_iter().map(|evse| (evse, self.evse_status(&EvseKey::new(evse.station_id, evse.evse_id)))).collect()
	}

	/// Every sub-unit key known for a station, from either the sub-unit or the status collection.
	pub fn status_keys_for_station(&self, station_id: u64) -> Vec<EvseKey> {
		let mut keys = self.evse_statuses.keys_under(&station_id);
		keys.extend(self.evses.keys_under(&station_id));
		keys.sort();
		keys.dedup();
		keys
	}

	/// Status records currently reporting `status`, in key order.
	pub fn statuses_with(&self, status: EvseStatus) -> Vec<&EvseStatusRecord> {
		self.evse_statuses.iter().filter(|r| r.status == Some(status)).collect()
	}

	/// Stations passing the station location filters, in presentation order.
	pub fn filtered_stations(&self) -> Vec<&Station> {
		self.stations.select_where(|s| self.station_filters.admits(s))
	}

	/// Events of one station, newest first.
	pub fn events_for_station(&self, station_id: u64) -> Vec<&StationEvent> {
		self.events.select_where(|e| e.station_id == Some(station_id))
	}

	/// Drops every record and resets the filters.
	pub fn clear(&mut self) {
		*self = Self::default();
		debug!("store.clear");
	}
}

/// Shared, lock-guarded [`EntityStore`].
///
/// Closures run under the lock; callers must not call back into the handle
/// from inside them.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle(Arc<RwLock<EntityStore>>);

impl StoreHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
		f(&self.0.read())
	}

	pub fn write<R>(&self, f: impl FnOnce(&mut EntityStore) -> R) -> R {
		f(&mut self.0.write())
	}
}

#[cfg(test)]
mod tests;
