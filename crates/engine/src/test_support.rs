//! Shared mocks for unit tests: a controllable document, a gateable
//! analyzer, scripted relevance, and recording sinks/observers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::collector::ChangeEventCollector;
use crate::debounce::PendingChanges;
use crate::error::AnalysisError;
use crate::host::{
	AnalyzerResolver, DocumentAnalyzer, ErrorSink, RelevanceHost, StoreObserver, TrackedDocument,
};
use crate::jobs::AnalysisJobManager;
use crate::key::FileKey;
use crate::store::DocumentInfoStore;

#[derive(Clone)]
pub(crate) struct TestDoc {
	key: FileKey,
	alive: Arc<AtomicBool>,
}

impl TrackedDocument for TestDoc {
	fn key(&self) -> FileKey {
		self.key
	}

	fn is_alive(&self) -> bool {
		self.alive.load(Ordering::SeqCst)
	}
}

pub(crate) fn doc(id: u64) -> TestDoc {
	TestDoc {
		key: FileKey(id),
		alive: Arc::new(AtomicBool::new(true)),
	}
}

pub(crate) fn dead_doc(id: u64) -> TestDoc {
	TestDoc {
		key: FileKey(id),
		alive: Arc::new(AtomicBool::new(false)),
	}
}

/// Analyzer whose builds can be parked behind a [`Notify`] barrier so tests
/// control task interleavings deterministically.
pub(crate) struct StubAnalyzer {
	value: AtomicU32,
	builds: AtomicUsize,
	gated: bool,
	open: AtomicBool,
	gate: Notify,
	fail_next: AtomicBool,
	produce_none: AtomicBool,
}

impl StubAnalyzer {
	fn new(gated: bool) -> Self {
		Self {
			value: AtomicU32::new(0),
			builds: AtomicUsize::new(0),
			gated,
			open: AtomicBool::new(false),
			gate: Notify::new(),
			fail_next: AtomicBool::new(false),
			produce_none: AtomicBool::new(false),
		}
	}

	pub(crate) fn set_value(&self, value: u32) {
		self.value.store(value, Ordering::SeqCst);
	}

	pub(crate) fn builds(&self) -> usize {
		self.builds.load(Ordering::SeqCst)
	}

	/// Allows one parked build to proceed.
	pub(crate) fn proceed(&self) {
		self.gate.notify_one();
	}

	/// Opens the gate permanently and wakes every parked build.
	pub(crate) fn proceed_all(&self) {
		self.open.store(true, Ordering::SeqCst);
		self.gate.notify_waiters();
	}

	pub(crate) fn fail_next(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}

	pub(crate) fn produce_none(&self) {
		self.produce_none.store(true, Ordering::SeqCst);
	}
}

#[async_trait]
impl DocumentAnalyzer<TestDoc, u32> for StubAnalyzer {
	async fn build(
		&self,
		_doc: &TestDoc,
		cancel: &CancellationToken,
	) -> Result<Option<u32>, AnalysisError> {
		self.builds.fetch_add(1, Ordering::SeqCst);
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(AnalysisError::Analyzer("synthetic failure".into()));
		}
		if self.gated && !self.open.load(Ordering::SeqCst) {
			tokio::select! {
				_ = cancel.cancelled() => return Ok(None),
				_ = self.gate.notified() => {}
			}
		}
		if self.produce_none.swap(false, Ordering::SeqCst) {
			return Ok(None);
		}
		Ok(Some(self.value.load(Ordering::SeqCst)))
	}
}

pub(crate) struct StubResolver {
	analyzer: Option<Arc<StubAnalyzer>>,
}

impl AnalyzerResolver<TestDoc, u32> for StubResolver {
	fn resolve(&self, _doc: &TestDoc) -> Option<Arc<dyn DocumentAnalyzer<TestDoc, u32>>> {
		self.analyzer
			.clone()
			.map(|analyzer| analyzer as Arc<dyn DocumentAnalyzer<TestDoc, u32>>)
	}
}

pub(crate) struct StubRelevance {
	fast: AtomicBool,
	authoritative: AtomicBool,
}

impl Default for StubRelevance {
	fn default() -> Self {
		Self {
			fast: AtomicBool::new(true),
			authoritative: AtomicBool::new(true),
		}
	}
}

impl StubRelevance {
	pub(crate) fn set_fast(&self, relevant: bool) {
		self.fast.store(relevant, Ordering::SeqCst);
	}

	pub(crate) fn set_authoritative(&self, relevant: bool) {
		self.authoritative.store(relevant, Ordering::SeqCst);
	}
}

#[async_trait]
impl RelevanceHost<TestDoc> for StubRelevance {
	fn fast_relevant(&self, _doc: &TestDoc) -> bool {
		self.fast.load(Ordering::SeqCst)
	}

	async fn authoritative_relevant(&self, _doc: &TestDoc) -> Result<bool, AnalysisError> {
		Ok(self.authoritative.load(Ordering::SeqCst))
	}
}

#[derive(Default)]
pub(crate) struct RecordingSink {
	reports: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingSink {
	pub(crate) fn reports(&self) -> Vec<(&'static str, String)> {
		self.reports.lock().clone()
	}
}

impl ErrorSink for RecordingSink {
	fn report(&self, context: &'static str, error: &AnalysisError) {
		self.reports.lock().push((context, error.to_string()));
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreEvent {
	Changed(FileKey, u32),
	Removed(FileKey),
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
	events: Mutex<Vec<StoreEvent>>,
}

impl RecordingObserver {
	pub(crate) fn events(&self) -> Vec<StoreEvent> {
		self.events.lock().clone()
	}
}

impl StoreObserver<u32> for RecordingObserver {
	fn info_changed(&self, key: FileKey, info: &u32) {
		self.events.lock().push(StoreEvent::Changed(key, *info));
	}

	fn info_removed(&self, key: FileKey) {
		self.events.lock().push(StoreEvent::Removed(key));
	}
}

/// Fully wired pipeline without the session loops; tests drive ticks and
/// requests by hand.
pub(crate) struct Pipeline {
	pub(crate) collector: Arc<ChangeEventCollector<TestDoc>>,
	pub(crate) pending: Arc<PendingChanges<TestDoc>>,
	pub(crate) jobs: Arc<AnalysisJobManager<TestDoc, u32>>,
	pub(crate) store: Arc<DocumentInfoStore<u32>>,
	pub(crate) analyzer: Arc<StubAnalyzer>,
	pub(crate) relevance: Arc<StubRelevance>,
	pub(crate) errors: Arc<RecordingSink>,
	pub(crate) observer: Arc<RecordingObserver>,
}

impl Pipeline {
	pub(crate) fn new() -> Self {
		Self::build(false, true)
	}

	pub(crate) fn gated() -> Self {
		Self::build(true, true)
	}

	pub(crate) fn without_analyzer() -> Self {
		Self::build(false, false)
	}

	fn build(gated: bool, with_analyzer: bool) -> Self {
		let analyzer = Arc::new(StubAnalyzer::new(gated));
		let resolver = Arc::new(StubResolver {
			analyzer: with_analyzer.then(|| analyzer.clone()),
		});
		let relevance = Arc::new(StubRelevance::default());
		let errors = Arc::new(RecordingSink::default());
		let store = Arc::new(DocumentInfoStore::new());
		let observer = Arc::new(RecordingObserver::default());
		store.subscribe(observer.clone());
		let jobs = Arc::new(AnalysisJobManager::new(
			relevance.clone(),
			resolver,
			errors.clone(),
			store.clone(),
			CancellationToken::new(),
		));
		Self {
			collector: Arc::new(ChangeEventCollector::new()),
			pending: Arc::new(PendingChanges::new()),
			jobs,
			store,
			analyzer,
			relevance,
			errors,
			observer,
		}
	}
}
