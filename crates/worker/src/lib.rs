//! Shared async task primitives for the analysis pipeline.
//!
//! Two concerns live here:
//!
//! - [`GenerationClock`]: monotonic instance identity for respawnable tasks,
//!   so a finished task can tell whether a registry slot still belongs to it.
//! - [`PeriodicTask`] + [`run_periodic`]: the cooperative fixed-interval loop
//!   shared by every periodic component of a session. Tick failures are
//!   logged and the loop keeps ticking; only cancellation of the owning
//!   session stops it.

mod periodic;
mod token;

pub use periodic::{PeriodicTask, run_periodic};
pub use token::GenerationClock;
