use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::collector::ChangeEventCollector;
use crate::debounce::PendingChanges;
use crate::error::AnalysisError;
use crate::host::{DocumentInfo, ErrorSink, RelevanceHost, TrackedDocument};
use crate::jobs::{AnalysisJobManager, CancelReason};
use crate::key::FileKey;
use crate::store::DocumentInfoStore;

/// Per-document change listener handed to the host on open.
///
/// The host invokes [`buffer_changed`](Self::buffer_changed) synchronously on
/// every edit. The close path deactivates the listener before tearing
/// anything else down, so no raw event for a closed document can enter the
/// queue.
pub struct ChangeListener<D: TrackedDocument> {
	doc: D,
	active: AtomicBool,
	collector: Arc<ChangeEventCollector<D>>,
}

impl<D: TrackedDocument> ChangeListener<D> {
	fn new(doc: D, collector: Arc<ChangeEventCollector<D>>) -> Self {
		Self {
			doc,
			active: AtomicBool::new(true),
			collector,
		}
	}

	/// Records one raw edit. O(1) on the interactive thread.
	pub fn buffer_changed(&self) {
		if self.active.load(Ordering::Acquire) {
			self.collector.on_change(self.doc.clone());
		}
	}

	fn detach(&self) {
		self.active.store(false, Ordering::Release);
	}

	#[cfg(test)]
	pub(crate) fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}
}

/// Reacts to document open/close and coordinates teardown with in-flight
/// jobs and the store.
///
/// State machine per document: untracked → tracked (listener attached,
/// builds flowing) → untracked again on close, with every intermediate
/// resource reclaimed in an order that makes post-close writes impossible.
pub struct LifecycleCoordinator<D: TrackedDocument, I: DocumentInfo> {
	listeners: Mutex<FxHashMap<FileKey, Arc<ChangeListener<D>>>>,
	relevance: Arc<dyn RelevanceHost<D>>,
	errors: Arc<dyn ErrorSink>,
	collector: Arc<ChangeEventCollector<D>>,
	pending: Arc<PendingChanges<D>>,
	jobs: Arc<AnalysisJobManager<D, I>>,
	store: Arc<DocumentInfoStore<I>>,
}

impl<D: TrackedDocument, I: DocumentInfo> LifecycleCoordinator<D, I> {
	pub(crate) fn new(
		relevance: Arc<dyn RelevanceHost<D>>,
		errors: Arc<dyn ErrorSink>,
		collector: Arc<ChangeEventCollector<D>>,
		pending: Arc<PendingChanges<D>>,
		jobs: Arc<AnalysisJobManager<D, I>>,
		store: Arc<DocumentInfoStore<I>>,
	) -> Self {
		Self {
			listeners: Mutex::new(FxHashMap::default()),
			relevance,
			errors,
			collector,
			pending,
			jobs,
			store,
		}
	}

	/// Starts tracking a newly opened document.
	///
	/// The fast relevance check gates everything: when it fails no listener
	/// is attached and the document is never tracked, at the cost of exactly
	/// one cheap check per open. On success the listener is attached and an
	/// initial build is requested through the same path as debounce rebuilds.
	pub fn open(&self, doc: D) -> Option<Arc<ChangeListener<D>>> {
		if !self.relevance.fast_relevant(&doc) {
			tracing::trace!(key = %doc.key(), "lifecycle.open skipped");
			return None;
		}

		let key = doc.key();
		let listener = {
			let mut listeners = self.listeners.lock();
			if listeners.contains_key(&key) {
				// Attaching a second listener is a caller bug, not a runtime
				// condition; abort the open rather than corrupt tracking.
				debug_assert!(false, "listener already attached for {key}");
				self.errors
					.report("lifecycle.open", &AnalysisError::AlreadyTracked(key));
				return None;
			}
			let listener = Arc::new(ChangeListener::new(
				doc.clone(),
				Arc::clone(&self.collector),
			));
			listeners.insert(key, Arc::clone(&listener));
			listener
		};

		tracing::debug!(%key, "lifecycle.open");
		self.jobs.request(&doc);
		Some(listener)
	}

	/// Stops tracking a closed document.
	///
	/// Ordering matters: deactivate the listener first (no further raw
	/// events for this key), purge queued events and the pending entry (no
	/// useless rebuild, no leaked buffer handle), cancel the running job,
	/// and finally remove the store record under its write guard. The
	/// debounce fire pass holds the pending-entry lock, so once the purge
	/// here returns, any job that pass spawned for this key is registered
	/// and the cancel below reaches it; a job past its analyzer step
	/// re-checks cancellation under the store's write guard. Together these
	/// make a post-close write impossible, regardless of ordering races.
	pub fn close(&self, key: FileKey) {
		if let Some(listener) = self.listeners.lock().remove(&key) {
			listener.detach();
		}
		self.collector.purge(key);
		self.pending.remove(key);
		self.jobs.cancel(key, CancelReason::Closed);
		self.store.remove(key);
		tracing::debug!(%key, "lifecycle.close");
	}

	/// Session teardown: cancel every job, drop queued work and listeners.
	pub(crate) fn teardown(&self) {
		self.jobs.cancel_all(CancelReason::Teardown);
		self.collector.clear();
		self.pending.clear();
		let mut listeners = self.listeners.lock();
		for listener in listeners.values() {
			listener.detach();
		}
		listeners.clear();
	}

	/// True while a change listener is attached for `key`.
	pub fn is_tracked(&self, key: FileKey) -> bool {
		self.listeners.lock().contains_key(&key)
	}
}
