use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use insight_worker::PeriodicTask;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::collector::ChangeEventCollector;
use crate::host::{DocumentInfo, TrackedDocument};
use crate::jobs::AnalysisJobManager;
use crate::key::FileKey;

/// Deduplicated set of documents awaiting rebuild.
///
/// The scheduler's whole tick pass runs under the entry lock, and the close
/// path takes the same lock to purge a key, so a fire pass and a close for
/// one document are mutually exclusive: a close serialized before the pass
/// leaves nothing to fire, and one serialized after it finds the freshly
/// spawned job already registered and cancels it.
pub(crate) struct PendingChanges<D> {
	entries: Mutex<FxHashMap<FileKey, D>>,
}

impl<D: TrackedDocument> PendingChanges<D> {
	pub(crate) fn new() -> Self {
		Self {
			entries: Mutex::new(FxHashMap::default()),
		}
	}

	pub(crate) fn remove(&self, key: FileKey) {
		self.entries.lock().remove(&key);
	}

	pub(crate) fn clear(&self) {
		self.entries.lock().clear();
	}
}

/// Quiet-period gate between raw edit events and analysis jobs.
///
/// Each tick drains the raw queue completely, dedupes the surviving events
/// into the pending set, and fires one rebuild per pending document once the
/// session has been quiet for the configured period. A burst of keystrokes
/// therefore costs exactly one rebuild per file, after the user pauses; while
/// events keep arriving nothing fires at all.
pub(crate) struct DebounceScheduler<D, I> {
	collector: Arc<ChangeEventCollector<D>>,
	pending: Arc<PendingChanges<D>>,
	jobs: Arc<AnalysisJobManager<D, I>>,
	quiet_period: Duration,
}

impl<D: TrackedDocument, I: DocumentInfo> DebounceScheduler<D, I> {
	pub(crate) fn new(
		collector: Arc<ChangeEventCollector<D>>,
		pending: Arc<PendingChanges<D>>,
		jobs: Arc<AnalysisJobManager<D, I>>,
		quiet_period: Duration,
	) -> Self {
		Self {
			collector,
			pending,
			jobs,
			quiet_period,
		}
	}
}

#[async_trait]
impl<D: TrackedDocument, I: DocumentInfo> PeriodicTask for DebounceScheduler<D, I> {
	type Error = Infallible;

	fn name(&self) -> &'static str {
		"debounce"
	}

	async fn tick(&self) -> Result<(), Infallible> {
		// The pending-entry lock is held for the whole pass. A close cannot
		// slip in between drain and fire: its purge of this key either runs
		// first (nothing left to fire) or blocks until the pass is done, at
		// which point the job it must cancel is already registered.
		let mut pending = self.pending.entries.lock();
		for doc in self.collector.drain() {
			// Events for buffers that died while queued are dropped here.
			if doc.is_alive() {
				pending.insert(doc.key(), doc);
			}
		}

		if pending.is_empty() {
			return Ok(());
		}
		if !self.collector.clock().quiet_for(self.quiet_period) {
			// More edits may still be coming; wait for more quiet.
			return Ok(());
		}

		self.collector.clock().clear();
		tracing::debug!(count = pending.len(), "debounce.fire");
		for (_, doc) in pending.drain() {
			self.jobs.request(&doc);
		}
		Ok(())
	}
}
