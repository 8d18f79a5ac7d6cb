//! Normalized entity store.
//!
//! Each entity kind lives in its own [`EntityCollection`] keyed by its
//! identity. Sub-unit statuses are kept apart from sub-units and joined at
//! read time, so a status push never has to touch the sub-unit record.
//! Derived views (location filters, station summary status) are recomputed
//! from the collections rather than stored.

/// Keyed collections with merge-on-upsert.
pub mod collection;
/// Entity trait and merge helpers.
pub mod entity;
/// Location filter options.
pub mod filters;
pub mod model;
/// Sub-unit status values and station summaries.
pub mod status;
mod store;

pub use collection::{EntityCollection, Upsert};
pub use entity::{ChildKey, Entity};
pub use filters::{ALL, LocationFilter, LocationFilters};
pub use model::{Evse, EvseKey, EvseStatusRecord, Located, Site, Station, StationEvent, User};
pub use status::EvseStatus;
pub use store::{EntityStore, StoreHandle};
