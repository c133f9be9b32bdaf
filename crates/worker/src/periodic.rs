use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// A unit of work driven on a fixed period for the lifetime of a session.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
	/// Error type surfaced by a failed tick.
	type Error: std::fmt::Display + Send;

	/// Short task name for log lines.
	fn name(&self) -> &'static str;

	/// Runs one tick.
	async fn tick(&self) -> Result<(), Self::Error>;
}

/// Drives `task` every `period` until `cancel` fires.
///
/// A failed tick is logged and the loop keeps ticking: losing the loop
/// permanently would silently stop all future work for the session, so only
/// cancellation of the owning session terminates it. Cancellation is observed
/// immediately, including mid-sleep.
pub async fn run_periodic<T: PeriodicTask>(task: T, period: Duration, cancel: CancellationToken) {
	let mut interval = tokio::time::interval(period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
	loop {
		tokio::select! {
			_ = cancel.cancelled() => {
				tracing::debug!(task = task.name(), "periodic.stop");
				return;
			}
			_ = interval.tick() => {
				if let Err(error) = task.tick().await {
					tracing::warn!(task = task.name(), error = %error, "periodic tick failed");
				}
			}
		}
	}
}
