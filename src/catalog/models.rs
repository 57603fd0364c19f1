//! Records discovered and extracted from the catalog.

use serde::{Deserialize, Serialize};

/// One occurrence of a class section in search results.
///
/// Unique on `(identifier, term_code)`; never mutated once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Listing {
    pub identifier: String,
    #[serde(rename = "termCode")]
    pub term_code: String,
}

impl Listing {
    pub fn new(identifier: impl Into<String>, term_code: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            term_code: term_code.into(),
        }
    }
}

/// Normalized detail record for one class number.
///
/// Field names match the schema consumed by the downstream loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub class_number: String,
    pub course_dept: String,
    pub course_code: String,
    pub class_section: String,
    pub course_title: String,
    pub school: String,
    pub career: String,
    pub class_type: String,
    pub credit_hours: String,
    pub grading_basis: String,
    pub consent: String,
    pub term_year: u16,
    pub term_season: String,
    pub session: String,
    pub dates: String,
    pub requirements: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub wl_capacity: u32,
    pub wl_occupied: u32,
    pub attributes: Option<Vec<String>>,
    pub meeting_days: Vec<String>,
    pub meeting_times: Vec<String>,
    pub meeting_dates: Vec<String>,
    pub instructors: Vec<String>,
}

impl CourseRecord {
    /// The key records are deduplicated on.
    pub fn identifier(&self) -> &str {
        &self.class_number
    }
}

/// Split a term label such as `"Fall 2024"` (or `"2024 Fall"`) into `(season, year)`.
pub fn parse_term_label(label: &str) -> Option<(String, u16)> {
    let mut year = None;
    let mut season = Vec::new();
    for token in label.split_whitespace() {
        match token.parse::<u16>() {
            Ok(y) if year.is_none() && token.len() == 4 => year = Some(y),
            _ => season.push(token),
        }
    }

    match (season.is_empty(), year) {
        (false, Some(year)) => Some((season.join(" "), year)),
        _ => None,
    }
}
