//! Pass B: hydrate stored listings into course records.

use crate::catalog::CatalogSource;
use crate::catalog::detail::extract_course;
use crate::catalog::errors::HarvestError;
use crate::catalog::models::Listing;
use crate::harvest::{ItemOutcome, Pass, RunLimits, RunSummary, drive, isolate};
use crate::store::{DetailStore, UpsertOutcome};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct DetailHarvest {
    source: Arc<dyn CatalogSource>,
    store: Arc<Mutex<DetailStore>>,
}

impl DetailHarvest {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<Mutex<DetailStore>>) -> Self {
        Self { source, store }
    }

    /// Fetch, extract, and upsert one record per listing.
    ///
    /// Listings sharing a class number across terms overwrite each other; the
    /// record reflects whichever fetch completed last.
    pub async fn run(
        &self,
        listings: Vec<Listing>,
        limits: &RunLimits,
    ) -> Result<RunSummary, HarvestError> {
        drive(Pass::Details, listings, limits, |listing| async move {
            let key = format!("{}/{}", listing.identifier, listing.term_code);
            let result = self.hydrate(&listing, &key).await;
            isolate(key, result)
        })
        .await
    }

    async fn hydrate(&self, listing: &Listing, key: &str) -> Result<ItemOutcome, HarvestError> {
        let document = self.source.detail(listing).await?;
        let record = extract_course(&document.body)?;
        if record.identifier() != listing.identifier {
            warn!(
                key,
                class_number = record.identifier(),
                "Detail page class number differs from listing"
            );
        }

        let outcome = self.store.lock().await.upsert(record).await?;
        debug!(key, replaced = outcome == UpsertOutcome::Replaced, "Listing hydrated");

        Ok(ItemOutcome::Succeeded {
            key: key.to_owned(),
            added: 1,
            truncated: false,
        })
    }
}
