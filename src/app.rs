use crate::catalog::keywords::KeywordEnumerator;
use crate::catalog::{CatalogClient, CatalogSource};
use crate::config::Config;
use crate::harvest::{DetailHarvest, ListingHarvest, Pass, RunLimits, RunSummary};
use crate::store::{DetailStore, ListingStore};
use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application struct holding the catalog client and store locations.
pub struct App {
    config: Config,
    source: Arc<dyn CatalogSource>,
    keywords: KeywordEnumerator,
}

impl App {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let client = CatalogClient::new(&config).context("Failed to create catalog client")?;
        let keywords = KeywordEnumerator::new(&config.truncating_prefixes);

        info!(
            base_url = config.base_url.as_str(),
            keywords = keywords.len(),
            expanded_prefixes = config.truncating_prefixes.len(),
            concurrency = config.concurrency,
            requests_per_second = config.requests_per_second,
            "catalog client configured"
        );

        Ok(Self::with_source(config, Arc::new(client), keywords))
    }

    /// Build an app around any catalog source.
    pub fn with_source(
        config: Config,
        source: Arc<dyn CatalogSource>,
        keywords: KeywordEnumerator,
    ) -> Self {
        Self {
            config,
            source,
            keywords,
        }
    }

    /// Run the selected passes in order.
    ///
    /// Returns success when every selected pass ran to the end, regardless of
    /// per-item failures. A pass stopped by shutdown skips the passes after it.
    pub async fn run(&self, passes: &[Pass], shutdown: CancellationToken) -> ExitCode {
        let limits = RunLimits::new(self.config.concurrency, self.config.run_budget, shutdown);

        for pass in passes {
            let result = match pass {
                Pass::Listings => self.run_listings(&limits).await,
                Pass::Details => self.run_details(&limits).await,
            };

            match result {
                Ok(summary) if summary.interrupted => {
                    warn!(pass = pass.as_str(), "Pass interrupted; rerun to continue");
                    return ExitCode::FAILURE;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(pass = pass.as_str(), error = ?e, "Pass aborted");
                    return ExitCode::FAILURE;
                }
            }
        }

        ExitCode::SUCCESS
    }

    pub async fn run_listings(&self, limits: &RunLimits) -> anyhow::Result<RunSummary> {
        let store = ListingStore::open(&self.config.listings_path)
            .await
            .context("Failed to open listing store")?;
        info!(path = %store.path().display(), existing = store.len(), "Listing store opened");

        let harvest = ListingHarvest::new(self.source.clone(), Arc::new(Mutex::new(store)));
        Ok(harvest.run(self.keywords.keywords(), limits).await?)
    }

    pub async fn run_details(&self, limits: &RunLimits) -> anyhow::Result<RunSummary> {
        let listings = ListingStore::open(&self.config.listings_path)
            .await
            .context("Failed to open listing store")?
            .snapshot();
        if listings.is_empty() {
            warn!("No listings stored; run the listing pass first");
        }

        let store = DetailStore::open(&self.config.details_path)
            .await
            .context("Failed to open detail store")?;
        info!(
            path = %store.path().display(),
            existing = store.len(),
            listings = listings.len(),
            "Detail store opened"
        );

        let harvest = DetailHarvest::new(self.source.clone(), Arc::new(Mutex::new(store)));
        Ok(harvest.run(listings, limits).await?)
    }
}
