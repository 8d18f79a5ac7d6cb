use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation counter for reconnecting lifecycles.
///
/// Generation 0 means "never started"; the first call to [`GenerationClock::next`] returns 1.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances and returns the new generation.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the most recently issued generation.
	pub fn current(&self) -> u64 {
		self.next.load(Ordering::Acquire)
	}
}

#[cfg(test)]
mod tests;
