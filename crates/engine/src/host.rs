//! Seams between the pipeline and its host editor.
//!
//! The pipeline stays correct regardless of the concrete behavior behind
//! these traits; they are also the mocking surface for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AnalysisError;
use crate::key::FileKey;

/// Bound for host info values stored by the pipeline.
///
/// The info itself is opaque; equality decides whether a store write warrants
/// a change notification.
pub trait DocumentInfo: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> DocumentInfo for T {}

/// Host-owned handle to one open document.
///
/// Implementations are cheap to clone (typically an `Arc` around platform
/// state): the change path clones one handle per raw edit event.
pub trait TrackedDocument: Clone + Send + Sync + 'static {
	/// Session-stable identity of this document.
	fn key(&self) -> FileKey;

	/// Cheap liveness probe: the buffer is still valid and writable.
	///
	/// Checked at queue-drain time so events for documents that became
	/// read-only or invalid while queued are dropped instead of rebuilt.
	fn is_alive(&self) -> bool;
}

/// Builds document info for one document.
///
/// May be slow (I/O, parsing) and must poll `cancel` cooperatively; the
/// pipeline discards the result of a cancelled build regardless.
#[async_trait]
pub trait DocumentAnalyzer<D, I>: Send + Sync {
	/// Returns `Ok(None)` when the analyzer produced nothing for this
	/// document; that is a logged skip, not an error.
	async fn build(
		&self,
		doc: &D,
		cancel: &CancellationToken,
	) -> Result<Option<I>, AnalysisError>;
}

/// Resolves the analyzer applicable to a document's language.
pub trait AnalyzerResolver<D, I>: Send + Sync {
	/// `None` means "not analyzable": a normal outcome, skipped silently.
	fn resolve(&self, doc: &D) -> Option<Arc<dyn DocumentAnalyzer<D, I>>>;
}

/// Two-tier relevance policy for open documents.
#[async_trait]
pub trait RelevanceHost<D>: Send + Sync {
	/// Allocation-light check safe on the interactive thread. Gates whether a
	/// change listener is attached at all: a document failing this check is
	/// never tracked.
	fn fast_relevant(&self, doc: &D) -> bool;

	/// Authoritative check (project membership, deeper validity). Only ever
	/// runs inside an analysis job, off the interactive thread.
	async fn authoritative_relevant(&self, doc: &D) -> Result<bool, AnalysisError>;
}

/// Fire-and-forget error reporting.
///
/// Implementations must not panic back into the pipeline.
pub trait ErrorSink: Send + Sync {
	fn report(&self, context: &'static str, error: &AnalysisError);
}

/// Store subscriber.
///
/// Delivery is synchronous at the mutation point and ordered per key; long
/// or re-entrant work belongs outside these callbacks.
pub trait StoreObserver<I>: Send + Sync {
	/// The info for `key` was inserted or replaced with a different value.
	fn info_changed(&self, key: FileKey, info: &I);

	/// `key` was removed. Announced on every close, record present or not,
	/// so downstream caches can always clear.
	fn info_removed(&self, key: FileKey);
}

/// Derived-view provider polled by the periodic refresher.
#[async_trait]
pub trait DerivedViewProvider: Send + Sync {
	/// Refreshes the derived view and reports whether its content changed.
	async fn refresh(&self) -> Result<bool, AnalysisError>;
}

/// Receives change notifications from the periodic refresher.
pub trait RefreshObserver: Send + Sync {
	fn derived_view_changed(&self);
}
