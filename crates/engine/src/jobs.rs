use std::sync::Arc;

use insight_worker::GenerationClock;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AnalysisError;
use crate::host::{AnalyzerResolver, DocumentInfo, ErrorSink, RelevanceHost, TrackedDocument};
use crate::key::FileKey;
use crate::store::{DocumentInfoStore, PutOutcome};

/// Why a running job was cancelled. Logged, never reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
	/// A newer request for the same key replaced this job.
	Superseded,
	/// The document closed while the job was in flight.
	Closed,
	/// The owning session is shutting down.
	Teardown,
}

/// Handle to the in-flight analysis task for one document.
struct RunningJob {
	generation: u64,
	cancel: CancellationToken,
	_task: JoinHandle<()>,
}

impl RunningJob {
	fn cancel(&self, key: FileKey, reason: CancelReason) {
		tracing::trace!(%key, generation = self.generation, reason = ?reason, "jobs.cancel");
		self.cancel.cancel();
	}
}

/// How a job body ended. Trace-only; none of these are errors.
#[derive(Debug, Clone, Copy)]
enum JobOutcome {
	Completed,
	Cancelled,
	Irrelevant,
	NoAnalyzer,
	Empty,
}

/// Everything a spawned job needs, shared behind one `Arc`.
struct JobContext<D, I> {
	registry: Mutex<FxHashMap<FileKey, RunningJob>>,
	relevance: Arc<dyn RelevanceHost<D>>,
	resolver: Arc<dyn AnalyzerResolver<D, I>>,
	errors: Arc<dyn ErrorSink>,
	store: Arc<DocumentInfoStore<I>>,
}

/// Builds and cancels the single asynchronous analysis job per document.
///
/// [`request`](Self::request) is the only spawn path and it supersedes any
/// in-flight job for the key first, so at most one non-terminal job per key
/// ever exists. Job tokens are children of the session token; disposing the
/// session cancels every job transitively.
pub struct AnalysisJobManager<D, I> {
	ctx: Arc<JobContext<D, I>>,
	generations: GenerationClock,
	session_cancel: CancellationToken,
}

impl<D: TrackedDocument, I: DocumentInfo> AnalysisJobManager<D, I> {
	pub(crate) fn new(
		relevance: Arc<dyn RelevanceHost<D>>,
		resolver: Arc<dyn AnalyzerResolver<D, I>>,
		errors: Arc<dyn ErrorSink>,
		store: Arc<DocumentInfoStore<I>>,
		session_cancel: CancellationToken,
	) -> Self {
		Self {
			ctx: Arc::new(JobContext {
				registry: Mutex::new(FxHashMap::default()),
				relevance,
				resolver,
				errors,
				store,
			}),
			generations: GenerationClock::new(),
			session_cancel,
		}
	}

	/// Cancels any in-flight job for the document's key, then starts a new
	/// asynchronous analysis job for it.
	pub fn request(&self, doc: &D) {
		let key = doc.key();
		let generation = self.generations.next();
		let cancel = self.session_cancel.child_token();

		// The registry lock is held across the spawn so the job's epilogue
		// cannot observe the registry before this entry is inserted.
		let mut registry = self.ctx.registry.lock();
		if let Some(prev) = registry.remove(&key) {
			prev.cancel(key, CancelReason::Superseded);
		}

		tracing::trace!(%key, generation, "jobs.request");
		let task = tokio::spawn(Self::run(
			Arc::clone(&self.ctx),
			doc.clone(),
			generation,
			cancel.clone(),
		));
		registry.insert(
			key,
			RunningJob {
				generation,
				cancel,
				_task: task,
			},
		);
	}

	/// Cancels and removes the running job for `key`, if any. Idempotent.
	pub fn cancel(&self, key: FileKey, reason: CancelReason) {
		if let Some(job) = self.ctx.registry.lock().remove(&key) {
			job.cancel(key, reason);
		}
	}

	/// Cancels every running job (session teardown).
	pub fn cancel_all(&self, reason: CancelReason) {
		let mut registry = self.ctx.registry.lock();
		for (key, job) in registry.drain() {
			job.cancel(key, reason);
		}
	}

	/// True while an analysis job for `key` is registered as in-flight.
	pub fn is_running(&self, key: FileKey) -> bool {
		self.ctx.registry.lock().contains_key(&key)
	}

	/// Number of registered in-flight jobs.
	pub fn running_count(&self) -> usize {
		self.ctx.registry.lock().len()
	}

	async fn run(
		ctx: Arc<JobContext<D, I>>,
		doc: D,
		generation: u64,
		cancel: CancellationToken,
	) {
		let key = doc.key();
		match Self::build(&ctx, &doc, &cancel).await {
			Ok(outcome) => {
				tracing::trace!(%key, generation, outcome = ?outcome, "jobs.done");
			}
			Err(error) => {
				// Failure during cancellation is still cancellation.
				if !cancel.is_cancelled() {
					ctx.errors.report("analysis job", &error);
				}
			}
		}

		// Unconditional cleanup of *this* job's entry; generation matching
		// keeps a superseded job from evicting its successor.
		let mut registry = ctx.registry.lock();
		if registry
			.get(&key)
			.is_some_and(|job| job.generation == generation)
		{
			registry.remove(&key);
		}
	}

	/// Job body, executed off the interactive thread.
	///
	/// Cancellation is checked at every step boundary: the document may close
	/// or a newer request may supersede this job at any point, and once
	/// cancellation is observed no store write or notification may follow.
	async fn build(
		ctx: &JobContext<D, I>,
		doc: &D,
		cancel: &CancellationToken,
	) -> Result<JobOutcome, AnalysisError> {
		if !ctx.relevance.authoritative_relevant(doc).await? {
			return Ok(JobOutcome::Irrelevant);
		}
		if cancel.is_cancelled() {
			return Ok(JobOutcome::Cancelled);
		}

		let Some(analyzer) = ctx.resolver.resolve(doc) else {
			return Ok(JobOutcome::NoAnalyzer);
		};
		if cancel.is_cancelled() {
			return Ok(JobOutcome::Cancelled);
		}

		let info = analyzer.build(doc, cancel).await?;
		if cancel.is_cancelled() {
			return Ok(JobOutcome::Cancelled);
		}
		let Some(info) = info else {
			tracing::debug!(key = %doc.key(), "analyzer produced no info");
			return Ok(JobOutcome::Empty);
		};

		// Final check runs under the store's write guard, so a close racing
		// with this completion can never land a post-close write.
		match ctx
			.store
			.put_guarded(doc.key(), info, || !cancel.is_cancelled())
		{
			PutOutcome::Rejected => Ok(JobOutcome::Cancelled),
			PutOutcome::Changed | PutOutcome::Unchanged => Ok(JobOutcome::Completed),
		}
	}
}
