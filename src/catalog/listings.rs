//! Extraction of `(class number, term)` pairs from search result pages.
//!
//! Result rows are elements whose `id` starts with [`ROW_ID_PREFIX`]. The pair is
//! embedded in the row's inline click handler, e.g.
//! `onclick="showClassDetail({classNumber: '1234', termCode: '1040'})"`.
//! `data-class-number`/`data-term-code` attributes take precedence when present.

use crate::catalog::models::Listing;
use html_scraper::{ElementRef, Html, Selector};
use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

pub const ROW_ID_PREFIX: &str = "classSection_";

static CLASS_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"classNumber\s*[:=]\s*['"]?([\w-]+)"#).unwrap());
static TERM_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"termCode\s*[:=]\s*['"]?([\w-]+)"#).unwrap());

/// Parse a (possibly multi-page, concatenated) result document into distinct listings,
/// in document order.
pub fn extract_listings(body: &str) -> IndexSet<Listing> {
    let html = Html::parse_document(body);
    let row_sel = Selector::parse(&format!(r#"[id^="{ROW_ID_PREFIX}"]"#)).unwrap();

    html.select(&row_sel).filter_map(parse_row).collect()
}

fn parse_row(row: ElementRef<'_>) -> Option<Listing> {
    let from_data = row
        .attr("data-class-number")
        .zip(row.attr("data-term-code"))
        .map(|(id, term)| (id.trim(), term.trim()))
        .filter(|(id, term)| !id.is_empty() && !term.is_empty());
    if let Some((id, term)) = from_data {
        return Some(Listing::new(id, term));
    }

    let handler = row.attr("onclick")?;
    let identifier = CLASS_NUMBER_RE.captures(handler).map(|c| c[1].to_owned());
    let term_code = TERM_CODE_RE.captures(handler).map(|c| c[1].to_owned());

    match (identifier, term_code) {
        (Some(identifier), Some(term_code)) => Some(Listing {
            identifier,
            term_code,
        }),
        _ => {
            trace!(row_id = row.attr("id"), "Skipping result row without listing key");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, class_number: &str, term: &str) -> String {
        format!(
            r#"<div id="{ROW_ID_PREFIX}{id}" class="classRow"
                 onclick="showClassDetail({{classNumber: '{class_number}', termCode: '{term}'}})">
                 <span>CS 1101</span>
               </div>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><div id=\"results\">{}</div></body></html>",
            rows.join("\n")
        )
    }

    #[test]
    fn test_extract_listings_basic() {
        let body = page(&[row("0", "A1", "T1"), row("1", "A2", "T1")]);
        let listings: Vec<Listing> = extract_listings(&body).into_iter().collect();
        assert_eq!(
            listings,
            vec![Listing::new("A1", "T1"), Listing::new("A2", "T1")]
        );
    }

    #[test]
    fn test_extract_listings_dedups_within_document() {
        let body = page(&[row("0", "1234", "1040"), row("1", "1234", "1040")]);
        assert_eq!(extract_listings(&body).len(), 1);
    }

    #[test]
    fn test_extract_listings_across_concatenated_pages() {
        let mut body = page(&[row("0", "1", "1040")]);
        body.push_str(&page(&[row("0", "2", "1040")]));
        body.push_str(&page(&[row("0", "3", "1045")]));
        let listings = extract_listings(&body);
        assert_eq!(listings.len(), 3);
        assert!(listings.contains(&Listing::new("3", "1045")));
    }

    #[test]
    fn test_extract_listings_skips_rows_without_key() {
        let body = page(&[
            format!(r#"<div id="{ROW_ID_PREFIX}x">no handler</div>"#),
            format!(r#"<div id="{ROW_ID_PREFIX}y" onclick="toggle()">no key</div>"#),
            format!(r#"<div id="{ROW_ID_PREFIX}z" onclick="show({{classNumber: '9'}})">half</div>"#),
            row("1", "5555", "1040"),
        ]);
        let listings: Vec<Listing> = extract_listings(&body).into_iter().collect();
        assert_eq!(listings, vec![Listing::new("5555", "1040")]);
    }

    #[test]
    fn test_extract_listings_ignores_other_elements() {
        let body = r#"<div id="header" onclick="show({classNumber: '1', termCode: '2'})"></div>"#;
        assert!(extract_listings(body).is_empty());
    }

    #[test]
    fn test_extract_listings_prefers_data_attributes() {
        let body = format!(
            r#"<tr id="{ROW_ID_PREFIX}0" data-class-number="777" data-term-code="1050"
                  onclick="show({{classNumber: '1', termCode: '2'}})"><td>x</td></tr>"#
        );
        let body = format!("<table>{body}</table>");
        let listings: Vec<Listing> = extract_listings(&body).into_iter().collect();
        assert_eq!(listings, vec![Listing::new("777", "1050")]);
    }

    #[test]
    fn test_extract_listings_double_quoted_handler() {
        let body = format!(
            r#"<div id="{ROW_ID_PREFIX}0" onclick='show({{classNumber:"42", termCode:"1040"}})'></div>"#
        );
        let listings: Vec<Listing> = extract_listings(&body).into_iter().collect();
        assert_eq!(listings, vec![Listing::new("42", "1040")]);
    }
}
