use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::error::AppError;
use crate::source::CourseSource;

/// Periodically reloads the catalog from the course source.
pub struct CatalogRefresher {
    catalog: Arc<CatalogStore>,
    source: Arc<dyn CourseSource>,
    interval: Duration,
}

impl CatalogRefresher {
    pub fn new(
        catalog: Arc<CatalogStore>,
        source: Arc<dyn CourseSource>,
        interval_secs: u64,
    ) -> Self {
        Self {
            catalog,
            source,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Runs forever; a failed refresh keeps the previous catalog.
    pub async fn start(self) {
        info!("Starting catalog refresher (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_once().await {
                Ok(count) => info!("Catalog refresh completed - {} courses", count),
                Err(e) => warn!("Catalog refresh failed: {:?}", e),
            }
        }
    }

    pub async fn run_once(&self) -> Result<usize, AppError> {
        self.catalog.refresh(self.source.as_ref()).await
    }
}
