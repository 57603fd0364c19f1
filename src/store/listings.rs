//! Append-only set of discovered listings.

use crate::catalog::errors::HarvestError;
use crate::catalog::models::Listing;
use crate::store::document;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Listings keyed on `(identifier, term_code)`, persisted as one JSON array in
/// discovery order. The set only grows.
#[derive(Debug)]
pub struct ListingStore {
    path: PathBuf,
    listings: IndexSet<Listing>,
}

impl ListingStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let path = path.into();
        let listings: IndexSet<Listing> = document::load_array(&path).await?.into_iter().collect();
        debug!(path = %path.display(), count = listings.len(), "Loaded listing store");
        Ok(Self { path, listings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn contains(&self, listing: &Listing) -> bool {
        self.listings.contains(listing)
    }

    /// Current listings in discovery order.
    pub fn snapshot(&self) -> Vec<Listing> {
        self.listings.iter().cloned().collect()
    }

    /// Merge a batch into the set and persist it. Returns how many pairs were new.
    ///
    /// Nothing is written when the batch adds nothing. If the write fails the
    /// in-memory set is rolled back to match the file.
    pub async fn record(
        &mut self,
        batch: impl IntoIterator<Item = Listing>,
    ) -> Result<usize, HarvestError> {
        let before = self.listings.len();
        self.listings.extend(batch);
        let added = self.listings.len() - before;
        if added == 0 {
            return Ok(0);
        }

        let items: Vec<&Listing> = self.listings.iter().collect();
        if let Err(e) = document::write_array(&self.path, &items).await {
            self.listings.truncate(before);
            return Err(e);
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_dedups_on_composite_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ListingStore::open(dir.path().join("listings.json"))
            .await
            .unwrap();

        let added = store
            .record([Listing::new("A1", "T1"), Listing::new("A2", "T1")])
            .await
            .unwrap();
        assert_eq!(added, 2);

        // Same identifier in another term is a distinct listing
        let added = store
            .record([Listing::new("A1", "T1"), Listing::new("A1", "T2")])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_record_persists_in_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut store = ListingStore::open(&path).await.unwrap();
        store
            .record([Listing::new("9", "T1"), Listing::new("1", "T1")])
            .await
            .unwrap();
        store.record([Listing::new("5", "T1")]).await.unwrap();

        let reopened = ListingStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.snapshot(),
            vec![
                Listing::new("9", "T1"),
                Listing::new("1", "T1"),
                Listing::new("5", "T1")
            ]
        );
    }

    #[tokio::test]
    async fn test_record_without_new_pairs_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut store = ListingStore::open(&path).await.unwrap();

        assert_eq!(store.record(Vec::new()).await.unwrap(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("listings.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let mut store = ListingStore::open(dir.path().join("other.json")).await.unwrap();
        store.path = path;

        let err = store.record([Listing::new("1", "T1")]).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(store.is_empty());
    }
}
