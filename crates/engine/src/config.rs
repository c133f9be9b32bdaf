use std::time::Duration;

/// Timing policy for one analysis session.
///
/// These are policy values, not structural requirements: hosts may tune them
/// (and tests shrink them) without changing pipeline behavior.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
	/// Debounce scheduler period.
	pub tick_interval: Duration,
	/// Minimum inactivity after the last raw edit before rebuilds fire.
	pub quiet_period: Duration,
	/// Derived-view refresh period.
	pub refresh_interval: Duration,
}

impl Default for AnalysisConfig {
	fn default() -> Self {
		Self {
			tick_interval: Duration::from_secs(1),
			quiet_period: Duration::from_secs(10),
			refresh_interval: Duration::from_secs(20),
		}
	}
}
