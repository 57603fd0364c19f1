//! Result-count detection and continuation-page math for search results.
//!
//! Search responses embed the size of the full result set in an inline script
//! (`totalRecords: 137`). Only the first page is returned by the search request;
//! the rest must be requested from the session-scoped page switcher.

use html_scraper::{Html, Selector};
use regex::Regex;
use std::sync::LazyLock;

static TOTAL_RECORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"totalRecords\s*:\s*(\d+)").unwrap());

/// Read the declared total result count from the first `<script>` mentioning it.
///
/// Returns 0 when no script carries the field, matching an empty result set.
pub fn find_total_records(body: &str) -> u32 {
    let html = Html::parse_document(body);
    let script_sel = Selector::parse("script").unwrap();

    html.select(&script_sel)
        .map(|script| script.text().collect::<String>())
        .find(|text| text.contains("totalRecords"))
        .and_then(|text| {
            TOTAL_RECORDS_RE
                .captures(&text)
                .and_then(|caps| caps[1].parse().ok())
        })
        .unwrap_or(0)
}

/// Number of pages to request after the first one.
///
/// `floor(total / page_size)`, minus one when the last page is exactly full.
/// A total of 0 would come out as -1 and is clamped to 0.
pub fn additional_pages(total_records: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let full_pages = total_records / page_size;
    let exact = u32::from(total_records % page_size == 0);
    full_pages.saturating_sub(exact)
}
