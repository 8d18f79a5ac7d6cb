//! View state shared through the location's query string.
//!
//! The map position, active list/map mode and search token live both in memory
//! and in the `lat`, `lng`, `z`, `view` and `search` parameters of the current
//! location. [`ViewStateSync`] keeps the two in agreement; other parameters of
//! the location are left as they are.

mod error;
mod map_state;
mod query;
/// Encoding of the persisted record.
pub mod record;
mod sync;

pub use error::{DecodeError, Result};
pub use map_state::{DEFAULT_MIN_LIST_ZOOM, MapPatch, MapState};
pub use query::QueryParams;
pub use record::{ViewMode, ViewStateRecord};
pub use sync::{Layout, Reconciled, ViewStateSync};
