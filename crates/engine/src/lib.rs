//! Debounced incremental analysis pipeline for open editor documents.
//!
//! Keeps a structural analysis ("document info") of every open file current
//! with minimal cost on the interactive thread:
//!
//! - [`ChangeEventCollector`] captures raw edit events in O(1) per keystroke;
//!   it is pure transport, no lookups and no analysis.
//! - The debounce scheduler coalesces bursts into one rebuild per file and
//!   fires only after a quiet period.
//! - [`AnalysisJobManager`] runs at most one cancellable analysis job per
//!   document; a new request supersedes the old job, and a cancelled job can
//!   never write back into the store.
//! - [`DocumentInfoStore`] serves lock-free reads and announces changes and
//!   removals to subscribers, with writes serialized by a single guard.
//! - [`AnalysisSession`] wires the pieces for one editing session; disposing
//!   it cancels every child job and loop transitively.
//!
//! Consumers (code lens, navigation, insight panels) only ever read the
//! store; they never trigger analysis themselves. A document whose analysis
//! keeps failing degrades to "no info yet", never to a user-facing error.

mod collector;
mod config;
mod debounce;
mod error;
mod host;
mod jobs;
mod key;
mod lifecycle;
mod refresh;
mod session;
mod store;

#[cfg(test)]
mod test_support;

pub use collector::ChangeEventCollector;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use host::{
	AnalyzerResolver, DerivedViewProvider, DocumentAnalyzer, DocumentInfo, ErrorSink,
	RefreshObserver, RelevanceHost, StoreObserver, TrackedDocument,
};
pub use jobs::{AnalysisJobManager, CancelReason};
pub use key::FileKey;
pub use lifecycle::{ChangeListener, LifecycleCoordinator};
pub use session::{AnalysisSession, DerivedViewBinding, SessionHost};
pub use store::{DocumentInfoRecord, DocumentInfoStore, PutOutcome};
