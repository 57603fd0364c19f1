//! Durable listing and course record storage.

pub mod details;
pub mod document;
pub mod listings;

pub use details::{DetailStore, UpsertOutcome};
pub use listings::ListingStore;
