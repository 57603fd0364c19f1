//! Error types for catalog fetching, extraction, and persistence.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("request to {url} failed")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),
    #[error("failed to persist {}", path.display())]
    PersistenceFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl HarvestError {
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::FetchFailed {
            url: url.into(),
            source,
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::PersistenceFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Persistence failures abort a pass; everything else is isolated to one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PersistenceFailed { .. })
    }
}

/// A structural element the detail or listing page was expected to carry is absent or unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("no value found for label '{label}'")]
    FieldMissing { label: &'static str },
    #[error("invalid value for '{label}': {value:?}")]
    InvalidValue { label: &'static str, value: String },
    #[error("class header missing or malformed")]
    HeaderMalformed,
}

/// The query's declared result count hit the platform cap, so its result set is known-incomplete.
///
/// Non-fatal: the document is still returned and parsed, the warning is surfaced to the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationWarning {
    pub query: String,
    pub total_records: u32,
    pub cap: u32,
}

impl fmt::Display for TruncationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "query {} reported {} records (cap {}), results are truncated",
            self.query, self.total_records, self.cap
        )
    }
}
