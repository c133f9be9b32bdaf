use std::sync::Arc;

use insight_worker::run_periodic;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collector::ChangeEventCollector;
use crate::config::AnalysisConfig;
use crate::debounce::{DebounceScheduler, PendingChanges};
use crate::host::{
	AnalyzerResolver, DerivedViewProvider, DocumentInfo, ErrorSink, RefreshObserver,
	RelevanceHost, TrackedDocument,
};
use crate::jobs::AnalysisJobManager;
use crate::key::FileKey;
use crate::lifecycle::{ChangeListener, LifecycleCoordinator};
use crate::refresh::PeriodicRefresher;
use crate::store::DocumentInfoStore;

/// Derived-view polling seam; optional because not every host has one.
pub struct DerivedViewBinding {
	pub provider: Arc<dyn DerivedViewProvider>,
	pub observer: Arc<dyn RefreshObserver>,
}

/// Host collaborator seams for one analysis session.
pub struct SessionHost<D, I> {
	pub relevance: Arc<dyn RelevanceHost<D>>,
	pub resolver: Arc<dyn AnalyzerResolver<D, I>>,
	pub errors: Arc<dyn ErrorSink>,
	/// Omit to run without the periodic derived-view refresher.
	pub derived_view: Option<DerivedViewBinding>,
}

/// One editing session's analysis pipeline.
///
/// Owns the root cancellation token; every analysis job and both periodic
/// loops are children of it, so shutting the session down (or dropping it)
/// cancels everything transitively.
pub struct AnalysisSession<D: TrackedDocument, I: DocumentInfo> {
	coordinator: LifecycleCoordinator<D, I>,
	jobs: Arc<AnalysisJobManager<D, I>>,
	store: Arc<DocumentInfoStore<I>>,
	cancel: CancellationToken,
	loops: Vec<JoinHandle<()>>,
}

impl<D: TrackedDocument, I: DocumentInfo> AnalysisSession<D, I> {
	/// Wires and starts the pipeline. Must be called inside a tokio runtime.
	pub fn start(config: AnalysisConfig, host: SessionHost<D, I>) -> Self {
		let cancel = CancellationToken::new();
		let store = Arc::new(DocumentInfoStore::new());
		let collector = Arc::new(ChangeEventCollector::new());
		let pending = Arc::new(PendingChanges::new());
		let jobs = Arc::new(AnalysisJobManager::new(
			Arc::clone(&host.relevance),
			host.resolver,
			Arc::clone(&host.errors),
			Arc::clone(&store),
			cancel.clone(),
		));

		let scheduler = DebounceScheduler::new(
			Arc::clone(&collector),
			Arc::clone(&pending),
			Arc::clone(&jobs),
			config.quiet_period,
		);
		let mut loops = vec![tokio::spawn(run_periodic(
			scheduler,
			config.tick_interval,
			cancel.child_token(),
		))];

		if let Some(binding) = host.derived_view {
			let refresher = PeriodicRefresher::new(
				binding.provider,
				binding.observer,
				Arc::clone(&host.errors),
			);
			loops.push(tokio::spawn(run_periodic(
				refresher,
				config.refresh_interval,
				cancel.child_token(),
			)));
		}

		let coordinator = LifecycleCoordinator::new(
			host.relevance,
			host.errors,
			collector,
			pending,
			Arc::clone(&jobs),
			Arc::clone(&store),
		);

		Self {
			coordinator,
			jobs,
			store,
			cancel,
			loops,
		}
	}

	/// The result store. Consumers read it and subscribe to it; they never
	/// trigger analysis through it.
	pub fn store(&self) -> &Arc<DocumentInfoStore<I>> {
		&self.store
	}

	/// Starts tracking an opened document. Returns the change listener the
	/// host must invoke on every edit, or `None` when the document is not
	/// relevant and stays untracked.
	pub fn open(&self, doc: D) -> Option<Arc<ChangeListener<D>>> {
		self.coordinator.open(doc)
	}

	/// Stops tracking a closed document; cancels its job, drops queued
	/// events, and announces the store removal.
	pub fn close(&self, key: FileKey) {
		self.coordinator.close(key);
	}

	/// True while a change listener is attached for `key`.
	pub fn is_tracked(&self, key: FileKey) -> bool {
		self.coordinator.is_tracked(key)
	}

	/// Requests an immediate rebuild, bypassing the debounce gate. Same job
	/// path as a debounce-triggered rebuild.
	pub fn request_rebuild(&self, doc: &D) {
		self.jobs.request(doc);
	}

	/// The per-document job manager (cancellation and in-flight queries).
	pub fn jobs(&self) -> &Arc<AnalysisJobManager<D, I>> {
		&self.jobs
	}

	/// Cancels every child job and loop, clears queued work, and waits for
	/// the periodic loops to wind down.
	pub async fn shutdown(mut self) {
		tracing::debug!("session.shutdown");
		self.cancel.cancel();
		self.coordinator.teardown();
		for handle in self.loops.drain(..) {
			let _ = handle.await;
		}
	}
}

impl<D: TrackedDocument, I: DocumentInfo> Drop for AnalysisSession<D, I> {
	fn drop(&mut self) {
		// Dropping without shutdown still cancels all children.
		self.cancel.cancel();
	}
}
