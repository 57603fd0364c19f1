//! Course records keyed by class number, last write wins.

use crate::catalog::errors::HarvestError;
use crate::catalog::models::CourseRecord;
use crate::store::document;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

#[derive(Debug)]
pub struct DetailStore {
    path: PathBuf,
    records: IndexMap<String, CourseRecord>,
}

impl DetailStore {
    /// Load persisted records. Duplicate identifiers in the file collapse to the last one.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let path = path.into();
        let records: IndexMap<String, CourseRecord> = document::load_array::<CourseRecord>(&path)
            .await?
            .into_iter()
            .map(|record| (record.identifier().to_owned(), record))
            .collect();
        debug!(path = %path.display(), count = records.len(), "Loaded detail store");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&CourseRecord> {
        self.records.get(identifier)
    }

    /// Insert or fully replace the record for its identifier, then persist the whole set.
    pub async fn upsert(&mut self, record: CourseRecord) -> Result<UpsertOutcome, HarvestError> {
        let key = record.identifier().to_owned();
        let previous = self.records.insert(key.clone(), record);

        let items: Vec<&CourseRecord> = self.records.values().collect();
        if let Err(e) = document::write_array(&self.path, &items).await {
            match previous {
                Some(old) => {
                    self.records.insert(key, old);
                }
                None => {
                    self.records.shift_remove(&key);
                }
            }
            return Err(e);
        }

        Ok(match previous {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(class_number: &str, title: &str) -> CourseRecord {
        CourseRecord {
            class_number: class_number.to_owned(),
            course_dept: "CS".to_owned(),
            course_code: "1101".to_owned(),
            class_section: "01".to_owned(),
            course_title: title.to_owned(),
            school: "College of Arts and Science".to_owned(),
            career: "Undergraduate".to_owned(),
            class_type: "Lecture".to_owned(),
            credit_hours: "3.0".to_owned(),
            grading_basis: "Student Option Grading".to_owned(),
            consent: "No Special Consent Required".to_owned(),
            term_year: 2024,
            term_season: "Fall".to_owned(),
            session: "Regular Academic Session".to_owned(),
            dates: "08/21/2024 - 12/05/2024".to_owned(),
            requirements: "MNS".to_owned(),
            description: None,
            notes: None,
            status: "Open".to_owned(),
            capacity: 100,
            enrolled: 90,
            wl_capacity: 10,
            wl_occupied: 0,
            attributes: None,
            meeting_days: vec!["MWF".to_owned()],
            meeting_times: vec!["10:10a-11:00a".to_owned()],
            meeting_dates: vec!["08/21/2024 - 12/05/2024".to_owned()],
            instructors: vec!["Smith, John".to_owned()],
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.json");
        let mut store = DetailStore::open(&path).await.unwrap();

        assert_eq!(
            store.upsert(record("1234", "First")).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(record("1234", "Second")).await.unwrap(),
            UpsertOutcome::Replaced
        );

        let reopened = DetailStore::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("1234").unwrap().course_title, "Second");
    }

    #[tokio::test]
    async fn test_upsert_keeps_other_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.json");
        let mut store = DetailStore::open(&path).await.unwrap();
        store.upsert(record("1", "One")).await.unwrap();
        store.upsert(record("2", "Two")).await.unwrap();
        store.upsert(record("1", "Uno")).await.unwrap();

        let reopened = DetailStore::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("1").unwrap().course_title, "Uno");
        assert_eq!(reopened.get("2").unwrap().course_title, "Two");
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_in_file_collapse_to_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.json");
        document::write_array(&path, &[record("7", "Old"), record("7", "New")])
            .await
            .unwrap();

        let store = DetailStore::open(&path).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("7").unwrap().course_title, "New");
    }

    #[tokio::test]
    async fn test_failed_write_restores_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DetailStore::open(dir.path().join("details.json"))
            .await
            .unwrap();
        store.upsert(record("1", "Kept")).await.unwrap();

        let blocked = dir.path().join("blocked.json");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();
        store.path = blocked;

        assert!(store.upsert(record("1", "Lost")).await.is_err());
        assert!(store.upsert(record("2", "Lost")).await.is_err());
        assert_eq!(store.get("1").unwrap().course_title, "Kept");
        assert!(store.get("2").is_none());
    }
}
