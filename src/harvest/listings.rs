//! Pass A: keyword sweep into the listing store.

use crate::catalog::CatalogSource;
use crate::catalog::errors::HarvestError;
use crate::catalog::listings::extract_listings;
use crate::harvest::{ItemOutcome, Pass, RunLimits, RunSummary, drive, isolate};
use crate::store::ListingStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct ListingHarvest {
    source: Arc<dyn CatalogSource>,
    store: Arc<Mutex<ListingStore>>,
}

impl ListingHarvest {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<Mutex<ListingStore>>) -> Self {
        Self { source, store }
    }

    /// Search every keyword and persist the listings found after each one.
    pub async fn run<I>(&self, keywords: I, limits: &RunLimits) -> Result<RunSummary, HarvestError>
    where
        I: IntoIterator<Item = String>,
    {
        drive(Pass::Listings, keywords, limits, |keyword| async move {
            let result = self.harvest_keyword(&keyword).await;
            isolate(keyword, result)
        })
        .await
    }

    async fn harvest_keyword(&self, keyword: &str) -> Result<ItemOutcome, HarvestError> {
        let document = self.source.search(keyword).await?;
        let listings = extract_listings(&document.body);
        let found = listings.len();

        let added = self.store.lock().await.record(listings).await?;
        debug!(
            keyword,
            total_records = document.total_records,
            pages = document.additional_pages + 1,
            found,
            added,
            "Keyword harvested"
        );

        Ok(ItemOutcome::Succeeded {
            key: keyword.to_owned(),
            added,
            truncated: document.truncation.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::Listing;
    use crate::catalog::{FetchedDocument, TruncationWarning};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio_util::sync::CancellationToken;

    /// Serves canned search pages; keywords without a page fail.
    struct CannedCatalog {
        pages: HashMap<String, String>,
        capped: Vec<String>,
    }

    #[async_trait]
    impl CatalogSource for CannedCatalog {
        async fn search(&self, keyword: &str) -> Result<FetchedDocument, HarvestError> {
            let body = self.pages.get(keyword).cloned().ok_or_else(|| {
                HarvestError::ExtractionFailed(
                    crate::catalog::ExtractionError::FieldMissing { label: "results" },
                )
            })?;
            let truncation = self.capped.iter().any(|k| k == keyword).then(|| TruncationWarning {
                query: keyword.to_owned(),
                total_records: 300,
                cap: 300,
            });
            Ok(FetchedDocument {
                url: format!("https://catalog.test/search?keywords={keyword}"),
                body,
                total_records: 0,
                additional_pages: 0,
                truncation,
            })
        }

        async fn detail(&self, _listing: &Listing) -> Result<FetchedDocument, HarvestError> {
            unreachable!("listing pass never fetches details")
        }
    }

    fn results_page(rows: &[(&str, &str)]) -> String {
        rows.iter()
            .enumerate()
            .map(|(i, (id, term))| {
                format!(
                    r#"<div id="classSection_{i}" onclick="showClassDetail({{classNumber: '{id}', termCode: '{term}'}})"></div>"#
                )
            })
            .collect()
    }

    fn limits() -> RunLimits {
        RunLimits::new(3, None, CancellationToken::new())
    }

    async fn harvest(
        catalog: CannedCatalog,
        path: &std::path::Path,
    ) -> (ListingHarvest, Arc<Mutex<ListingStore>>) {
        let store = Arc::new(Mutex::new(ListingStore::open(path).await.unwrap()));
        (ListingHarvest::new(Arc::new(catalog), store.clone()), store)
    }

    #[tokio::test]
    async fn test_failed_keyword_does_not_stop_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CannedCatalog {
            pages: HashMap::from([
                ("001".to_owned(), results_page(&[("1", "T1")])),
                ("003".to_owned(), results_page(&[("3", "T1"), ("4", "T1")])),
            ]),
            capped: Vec::new(),
        };
        let (pass, store) = harvest(catalog, &dir.path().join("listings.json")).await;

        let keywords = ["001", "002", "003"].map(str::to_owned);
        let summary = pass.run(keywords, &limits()).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].key, "002");
        assert_eq!(summary.added, 3);
        assert_eq!(store.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let pages = HashMap::from([
            ("140".to_owned(), results_page(&[("A1", "T1"), ("A2", "T1")])),
            ("314".to_owned(), results_page(&[("A2", "T1")])),
        ]);
        let keywords = || ["140", "314"].map(str::to_owned);

        let (pass, _) = harvest(
            CannedCatalog {
                pages: pages.clone(),
                capped: Vec::new(),
            },
            &path,
        )
        .await;
        let first = pass.run(keywords(), &limits()).await.unwrap();
        assert_eq!(first.added, 2);

        // Fresh process against the same file
        let (pass, store) = harvest(
            CannedCatalog {
                pages,
                capped: Vec::new(),
            },
            &path,
        )
        .await;
        let second = pass.run(keywords(), &limits()).await.unwrap();
        assert_eq!(second.added, 0);

        let store = store.lock().await;
        assert_eq!(store.len(), 2);
        assert!(store.contains(&Listing::new("A1", "T1")));
        assert!(store.contains(&Listing::new("A2", "T1")));
    }

    #[tokio::test]
    async fn test_truncated_keywords_reported() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CannedCatalog {
            pages: HashMap::from([("100".to_owned(), results_page(&[("9", "T1")]))]),
            capped: vec!["100".to_owned()],
        };
        let (pass, _) = harvest(catalog, &dir.path().join("listings.json")).await;

        let summary = pass.run(["100".to_owned()], &limits()).await.unwrap();
        assert_eq!(summary.truncated, vec!["100"]);
        assert_eq!(summary.added, 1);
    }
}
