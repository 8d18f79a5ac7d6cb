//! Value types shared by every layer of the fleet sync stack.
//!
//! Nothing here owns a task or a lock. The types are plain data with just
//! enough behavior to keep their invariants local:
//!
//! - [`LatLng`], [`MapView`], [`Bounds`] and [`ViewportKey`] describe map viewports.
//! - [`Cursor`] and [`CursorEnvelope`] carry opaque pagination continuations.
//! - [`ErrorReport`] and [`ErrorSink`] carry failures to the single error surface.

/// Opaque pagination cursors.
pub mod cursor;
/// Failure descriptors and the sink they are reported to.
pub mod error_report;
/// Boxed future aliases.
pub mod future;
/// Geographic coordinates, viewports and bounds.
pub mod geo;

pub use cursor::{Cursor, CursorEnvelope};
pub use error_report::{ErrorReport, ErrorSink, NoOpErrorSink, SharedErrorSink, UNKNOWN_ERROR_MESSAGE};
pub use future::BoxFutureStatic;
pub use geo::{Bounds, LatLng, MapView, Positioned, ViewportKey};
