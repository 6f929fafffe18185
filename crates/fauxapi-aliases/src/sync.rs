//! End-to-end alias synchronisation.

use crate::ranges::RangeSource;
use crate::reconcile::{AliasFilter, AliasReconciler, ReconcileReport};
use crate::Result;
use async_trait::async_trait;
use fauxapi_client::{ApiResponse, FauxapiClient};
use fauxapi_core::ConfigDocument;
use tracing::info;

/// Where the configuration document is loaded from and published to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the full configuration.
    async fn load_config(&self) -> Result<ConfigDocument>;

    /// Write the full configuration back and return the acknowledgement.
    async fn store_config(&self, document: &ConfigDocument) -> Result<ApiResponse>;
}

#[async_trait]
impl ConfigStore for FauxapiClient {
    async fn load_config(&self) -> Result<ConfigDocument> {
        self.config_document().await
    }

    async fn store_config(&self, document: &ConfigDocument) -> Result<ApiResponse> {
        self.config_set(&document.clone().into_value(), None).await
    }
}

/// Result of one synchronisation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// What the reconciler did.
    pub report: ReconcileReport,
    /// Acknowledgement returned when publishing.
    pub response: ApiResponse,
}

/// Loads the configuration, merges fetched ranges and publishes the result.
pub struct AliasSync<S, R> {
    store: S,
    source: R,
}

impl<S, R> AliasSync<S, R>
where
    S: ConfigStore,
    R: RangeSource,
{
    /// Create a sync flow over a configuration store and a range source.
    pub fn new(store: S, source: R) -> Self {
        Self { store, source }
    }

    /// Run one synchronisation pass.
    ///
    /// The configuration is always written back, even when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while loading, fetching, reconciling or
    /// publishing; nothing is retried.
    pub async fn run(&self, filter: &AliasFilter) -> Result<SyncOutcome> {
        let mut document = self.store.load_config().await?;
        let ranges = self.source.fetch_ranges().await?;

        let report = AliasReconciler::new(&mut document).apply(&ranges, filter)?;

        info!(
            regions = %filter.regions,
            services = %filter.services,
            changed = report.is_changed(),
            "Publishing configuration"
        );
        let response = self.store.store_config(&document).await?;

        Ok(SyncOutcome { report, response })
    }
}
