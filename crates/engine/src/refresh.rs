use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use insight_worker::PeriodicTask;

use crate::host::{DerivedViewProvider, ErrorSink, RefreshObserver};

/// Fixed-interval poll of the derived-view provider.
///
/// Sibling of the debounce scheduler with the same failure/continuation
/// contract: a failed refresh is reported and the loop carries on at the
/// next tick. Notifies only when the provider reports actual change, and
/// never touches the info store.
pub(crate) struct PeriodicRefresher {
	provider: Arc<dyn DerivedViewProvider>,
	observer: Arc<dyn RefreshObserver>,
	errors: Arc<dyn ErrorSink>,
}

impl PeriodicRefresher {
	pub(crate) fn new(
		provider: Arc<dyn DerivedViewProvider>,
		observer: Arc<dyn RefreshObserver>,
		errors: Arc<dyn ErrorSink>,
	) -> Self {
		Self {
			provider,
			observer,
			errors,
		}
	}
}

#[async_trait]
impl PeriodicTask for PeriodicRefresher {
	type Error = Infallible;

	fn name(&self) -> &'static str {
		"derived-view-refresh"
	}

	async fn tick(&self) -> Result<(), Infallible> {
		match self.provider.refresh().await {
			Ok(true) => {
				tracing::debug!("refresh.changed");
				self.observer.derived_view_changed();
			}
			Ok(false) => {}
			Err(error) => self.errors.report("derived view refresh", &error),
		}
		Ok(())
	}
}
