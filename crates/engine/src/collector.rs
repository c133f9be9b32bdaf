use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::host::TrackedDocument;
use crate::key::FileKey;

/// Timestamp of the most recent raw change event.
///
/// Touched on every raw event and cleared once a quiet-period rebuild pass
/// fires; if no events arrive the clock stays untouched. A cleared clock
/// counts as quiet so a drained-but-unfired pending set can never stall.
#[derive(Debug, Default)]
pub(crate) struct QuietPeriodClock {
	last_change: Mutex<Option<Instant>>,
}

impl QuietPeriodClock {
	fn touch(&self) {
		*self.last_change.lock() = Some(Instant::now());
	}

	pub(crate) fn clear(&self) {
		*self.last_change.lock() = None;
	}

	/// Boundary-inclusive: exactly-at-threshold counts as elapsed.
	pub(crate) fn quiet_for(&self, quiet_period: Duration) -> bool {
		match *self.last_change.lock() {
			None => true,
			Some(at) => at.elapsed() >= quiet_period,
		}
	}
}

/// Minimal-cost capture of raw change events on the interactive thread.
///
/// Purely transport: [`on_change`](Self::on_change) appends the document
/// handle to a queue and stamps the quiet-period clock. Key resolution,
/// deduplication and relevance all happen later, on the scheduler tick.
/// Multi-producer (interactive thread), single-consumer (scheduler drain).
pub struct ChangeEventCollector<D> {
	queue: Mutex<VecDeque<D>>,
	clock: QuietPeriodClock,
}

impl<D: TrackedDocument> ChangeEventCollector<D> {
	pub(crate) fn new() -> Self {
		Self {
			queue: Mutex::new(VecDeque::new()),
			clock: QuietPeriodClock::default(),
		}
	}

	/// Records one raw edit event. O(1); called synchronously per keystroke.
	pub fn on_change(&self, doc: D) {
		self.queue.lock().push_back(doc);
		self.clock.touch();
	}

	/// Removes and returns every queued event, in arrival order.
	pub(crate) fn drain(&self) -> Vec<D> {
		self.queue.lock().drain(..).collect()
	}

	/// Drops queued events for `key`.
	///
	/// Close path: prevents a useless rebuild and releases the queued buffer
	/// handles for the closed document.
	pub(crate) fn purge(&self, key: FileKey) {
		self.queue.lock().retain(|doc| doc.key() != key);
	}

	/// Drops every queued event (session teardown).
	pub(crate) fn clear(&self) {
		self.queue.lock().clear();
	}

	pub(crate) fn clock(&self) -> &QuietPeriodClock {
		&self.clock
	}

	#[cfg(test)]
	pub(crate) fn queued_len(&self) -> usize {
		self.queue.lock().len()
	}
}
