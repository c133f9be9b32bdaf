use crate::key::FileKey;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures surfaced by pipeline collaborators and pipeline internals.
///
/// Cancellation is deliberately not represented here: it is an expected
/// outcome and is absorbed silently wherever it is observed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
	/// External analyzer failed while building document info.
	#[error("analyzer failed: {0}")]
	Analyzer(String),
	/// Authoritative relevance probe failed.
	#[error("relevance probe failed: {0}")]
	Relevance(String),
	/// Derived-view refresh provider failed.
	#[error("derived view refresh failed: {0}")]
	Refresh(String),
	/// A document was opened twice without an intervening close.
	#[error("document {0} is already tracked")]
	AlreadyTracked(FileKey),
}
