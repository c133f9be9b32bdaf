use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counter handing out generation numbers to respawnable tasks.
///
/// A task remembers the generation it was spawned with and compares it
/// against the live registry entry before cleaning up, so a stale instance
/// never tears down state belonging to its successor. The numbers carry
/// identity only; relaxed ordering is sufficient.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	counter: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Hands out the next generation, starting from 1. Clones draw from the
	/// same sequence.
	pub fn next(&self) -> u64 {
		self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
	}
}
