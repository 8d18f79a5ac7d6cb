//! Pull-side data loading.
//!
//! A [`FetchSite`] owns the load state of one place in the client that pulls
//! data. The host re-evaluates it with a [`FetchRequest`] whenever something
//! relevant changes; the site decides whether that warrants a request.
//! [`ScrollFetch`] and [`ViewportFetch`] derive those requests from scroll
//! positions and map viewports. [`PullClient`] talks to the list endpoints.

pub mod api;
mod error;
mod load_state;
mod scroll;
mod site;
mod viewport;

pub use api::{ApiPaths, ListQuery, Page, PullClient, Resource};
pub use error::{FetchError, Result};
pub use load_state::LoadState;
pub use scroll::{Paginated, ScrollFetch, ScrollMetrics};
pub use site::{FetchRequest, FetchSite, RunOutcome};
pub use viewport::{DEFAULT_VIEWPORT_PRECISION, ViewportFetch};
