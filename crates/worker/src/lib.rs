//! Task primitives shared by the fleet sync crates.
//!
//! Every background activity in the stack (socket drivers, heartbeat timers,
//! batch flushes, pull requests) is spawned through this crate so it carries a
//! [`TaskClass`] in traces and, where it is owned, stops when its owner drops.

mod class;
mod periodic;
mod spawn;
mod task;
mod token;

pub use class::TaskClass;
pub use periodic::spawn_periodic;
pub use spawn::spawn;
pub use task::OwnedTask;
pub use token::GenerationClock;
pub use tokio_util::sync::CancellationToken;
