//! Wiring of the fleet sync stack.
//!
//! [`SyncLayer`] owns one push channel to the station event endpoint, feeds
//! status pushes through an [`UpdateBatcher`](evfleet_channel::UpdateBatcher)
//! into the shared [`StoreHandle`](evfleet_store::StoreHandle), and hands out
//! pull actions and fetch call sites configured from [`SyncConfig`]. Failures
//! that never reach a caller land on the [`ErrorBoard`].

pub mod config;
mod error_board;
mod layer;

pub use config::{ConfigError, Result, SyncConfig};
pub use error_board::ErrorBoard;
pub use layer::{SyncLayer, event_from_push, status_updates};
