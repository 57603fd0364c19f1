//! Class search catalog: fetching, pagination, and page extraction.

pub mod client;
pub mod detail;
pub mod errors;
pub mod keywords;
pub mod listings;
pub mod models;
pub mod pagination;

pub use client::{CatalogClient, CatalogSource, FetchedDocument};
pub use errors::{ExtractionError, HarvestError, TruncationWarning};
pub use models::{CourseRecord, Listing};
