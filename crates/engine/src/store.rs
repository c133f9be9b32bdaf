use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::host::{DocumentInfo, StoreObserver};
use crate::key::FileKey;

/// One analysis result, owned by the store from insertion until removal.
#[derive(Debug)]
pub struct DocumentInfoRecord<I> {
	key: FileKey,
	info: I,
}

impl<I> DocumentInfoRecord<I> {
	/// The document this record belongs to.
	pub fn key(&self) -> FileKey {
		self.key
	}

	/// The analysis result.
	pub fn info(&self) -> &I {
		&self.info
	}
}

type Snapshot<I> = FxHashMap<FileKey, Arc<DocumentInfoRecord<I>>>;

/// Outcome of a guarded store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
	/// Value inserted or replaced; subscribers were notified.
	Changed,
	/// Same value as before; replaced silently, no notification.
	Unchanged,
	/// The admission check failed under the guard; nothing was written.
	Rejected,
}

/// Concurrent keyed store of analysis results with change notification.
///
/// Reads are lock-free over an [`ArcSwap`] snapshot. All mutations serialize
/// through a single write guard, so a build completing and a close-path
/// removal for the same key can never interleave destructively. Per-key
/// writes are therefore totally ordered.
pub struct DocumentInfoStore<I> {
	snapshot: ArcSwap<Snapshot<I>>,
	write_guard: Mutex<()>,
	observers: RwLock<Vec<Arc<dyn StoreObserver<I>>>>,
}

impl<I: DocumentInfo> Default for DocumentInfoStore<I> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I: DocumentInfo> DocumentInfoStore<I> {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			snapshot: ArcSwap::from_pointee(Snapshot::default()),
			write_guard: Mutex::new(()),
			observers: RwLock::new(Vec::new()),
		}
	}

	/// Registers a subscriber for change and removal notifications.
	pub fn subscribe(&self, observer: Arc<dyn StoreObserver<I>>) {
		self.observers.write().push(observer);
	}

	/// Writes `info` for `key` and notifies subscribers if the value differs
	/// from the previous one.
	///
	/// Idempotent at the notification level: writing the same value twice
	/// produces exactly one notification total.
	pub fn put(&self, key: FileKey, info: I) -> PutOutcome {
		self.put_guarded(key, info, || true)
	}

	/// [`put`](Self::put) with a final admission check under the write guard.
	///
	/// Analysis jobs pass their cancellation probe here: once `admit` returns
	/// false the job can no longer produce a store write or a notification,
	/// which is what makes the close path race-free.
	pub fn put_guarded(
		&self,
		key: FileKey,
		info: I,
		admit: impl FnOnce() -> bool,
	) -> PutOutcome {
		let _guard = self.write_guard.lock();
		if !admit() {
			tracing::trace!(%key, "store.put rejected");
			return PutOutcome::Rejected;
		}

		let prev = self.snapshot.load();
		let unchanged = prev.get(&key).is_some_and(|record| record.info == info);
		let record = Arc::new(DocumentInfoRecord { key, info });

		let mut next = (**prev).clone();
		next.insert(key, Arc::clone(&record));
		self.snapshot.store(Arc::new(next));

		if unchanged {
			tracing::trace!(%key, "store.put unchanged");
			return PutOutcome::Unchanged;
		}

		tracing::trace!(%key, "store.put changed");
		for observer in self.observers.read().iter() {
			observer.info_changed(key, record.info());
		}
		PutOutcome::Changed
	}

	/// Removes the record for `key` and announces the removal.
	///
	/// The removal is announced even when no record existed: close always
	/// fires `info_removed` so downstream caches can clear unconditionally.
	pub fn remove(&self, key: FileKey) {
		let _guard = self.write_guard.lock();
		let prev = self.snapshot.load();
		if prev.contains_key(&key) {
			let mut next = (**prev).clone();
			next.remove(&key);
			self.snapshot.store(Arc::new(next));
		}
		tracing::trace!(%key, "store.remove");
		for observer in self.observers.read().iter() {
			observer.info_removed(key);
		}
	}

	/// Current record for `key`, if any. Lock-free.
	pub fn get(&self, key: FileKey) -> Option<Arc<DocumentInfoRecord<I>>> {
		self.snapshot.load().get(&key).cloned()
	}

	/// All current records. Lock-free snapshot.
	pub fn all(&self) -> Vec<Arc<DocumentInfoRecord<I>>> {
		self.snapshot.load().values().cloned().collect()
	}

	/// All current keys. Lock-free snapshot.
	pub fn keys(&self) -> Vec<FileKey> {
		self.snapshot.load().keys().copied().collect()
	}

	/// Number of records. Lock-free.
	pub fn len(&self) -> usize {
		self.snapshot.load().len()
	}

	/// True when no records exist. Lock-free.
	pub fn is_empty(&self) -> bool {
		self.snapshot.load().is_empty()
	}
}
