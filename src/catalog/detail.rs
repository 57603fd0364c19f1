//! Class detail page extraction.
//!
//! Detail pages are a fixed layout: a title header (`CS 1101-01: Programming and
//! Problem Solving`), label/value cell pairs, and a meeting pattern table. Which
//! label feeds which field lives in [`DETAIL_SCHEMA`]; a markup change should only
//! need an edit there.

use crate::catalog::errors::ExtractionError;
use crate::catalog::models::{CourseRecord, parse_term_label};
use html_scraper::{ElementRef, Html, Selector};
use indexmap::IndexSet;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Record fields populated from a labeled cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ClassNumber,
    School,
    Career,
    ClassType,
    CreditHours,
    GradingBasis,
    Consent,
    Term,
    Session,
    Dates,
    Requirements,
    Status,
    Capacity,
    Enrolled,
    WaitlistCapacity,
    WaitlistOccupied,
    Description,
    Notes,
    Attributes,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub field: Field,
    /// Missing required labels abort the record; missing optional ones become `None`.
    pub required: bool,
}

const fn required(label: &'static str, field: Field) -> FieldSpec {
    FieldSpec {
        label,
        field,
        required: true,
    }
}

const fn optional(label: &'static str, field: Field) -> FieldSpec {
    FieldSpec {
        label,
        field,
        required: false,
    }
}

pub const DETAIL_SCHEMA: &[FieldSpec] = &[
    required("Class Number", Field::ClassNumber),
    required("School", Field::School),
    required("Career", Field::Career),
    required("Component", Field::ClassType),
    required("Hours", Field::CreditHours),
    required("Grading Basis", Field::GradingBasis),
    required("Consent", Field::Consent),
    required("Term", Field::Term),
    required("Session", Field::Session),
    required("Session Dates", Field::Dates),
    required("Requirement Designation", Field::Requirements),
    required("Status", Field::Status),
    required("Class Capacity", Field::Capacity),
    required("Total Enrolled", Field::Enrolled),
    required("Wait List Capacity", Field::WaitlistCapacity),
    required("Total on Wait List", Field::WaitlistOccupied),
    optional("Description", Field::Description),
    optional("Notes", Field::Notes),
    optional("Attributes", Field::Attributes),
];

/// `DEPT CODE-SECTION: Title`
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z&]+)\s+([0-9A-Za-z]+)\s*-\s*([0-9A-Za-z]+)\s*:\s*(.+)$").unwrap()
});

/// Label cells found on the page, keyed by schema label. First occurrence wins.
struct LabeledCells<'a> {
    values: HashMap<&'static str, ElementRef<'a>>,
}

impl<'a> LabeledCells<'a> {
    fn collect(html: &'a Html) -> Self {
        let cell_sel = Selector::parse("td, th").unwrap();
        let mut values = HashMap::new();

        for cell in html.select(&cell_sel) {
            let label = normalize_label(&cell.text().collect::<String>());
            let Some(spec) = DETAIL_SCHEMA.iter().find(|spec| spec.label == label) else {
                continue;
            };
            if values.contains_key(spec.label) {
                continue;
            }
            if let Some(value) = cell.next_siblings().find_map(ElementRef::wrap) {
                values.insert(spec.label, value);
            }
        }

        Self { values }
    }

    fn cell(&self, label: &'static str) -> Option<ElementRef<'a>> {
        self.values.get(label).copied()
    }

    fn text(&self, label: &'static str) -> Result<String, ExtractionError> {
        self.cell(label)
            .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
            .ok_or(ExtractionError::FieldMissing { label })
    }

    fn optional_text(&self, label: &'static str) -> Option<String> {
        self.cell(label)
            .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
            .filter(|text| !text.is_empty())
    }

    fn count(&self, label: &'static str) -> Result<u32, ExtractionError> {
        let raw = self.text(label)?;
        raw.replace(',', "")
            .parse()
            .map_err(|_| ExtractionError::InvalidValue { label, value: raw })
    }

    /// One entry per line or list item in the cell.
    fn lines(&self, label: &'static str) -> Option<Vec<String>> {
        let lines = text_lines(self.cell(label)?);
        (!lines.is_empty()).then_some(lines)
    }
}

/// Parse a class detail page into a normalized record.
pub fn extract_course(body: &str) -> Result<CourseRecord, ExtractionError> {
    let html = Html::parse_document(body);
    let (course_dept, course_code, class_section, course_title) = parse_header(&html)?;
    let cells = LabeledCells::collect(&html);

    for spec in DETAIL_SCHEMA.iter().filter(|spec| spec.required) {
        if cells.cell(spec.label).is_none() {
            return Err(ExtractionError::FieldMissing { label: spec.label });
        }
    }

    let term = cells.text(label_of(Field::Term))?;
    let (term_season, term_year) =
        parse_term_label(&term).ok_or_else(|| ExtractionError::InvalidValue {
            label: label_of(Field::Term),
            value: term.clone(),
        })?;

    let meetings = parse_meetings(&html);

    Ok(CourseRecord {
        class_number: cells.text(label_of(Field::ClassNumber))?,
        course_dept,
        course_code,
        class_section,
        course_title,
        school: cells.text(label_of(Field::School))?,
        career: cells.text(label_of(Field::Career))?,
        class_type: cells.text(label_of(Field::ClassType))?,
        credit_hours: cells.text(label_of(Field::CreditHours))?,
        grading_basis: cells.text(label_of(Field::GradingBasis))?,
        consent: cells.text(label_of(Field::Consent))?,
        term_year,
        term_season,
        session: cells.text(label_of(Field::Session))?,
        dates: cells.text(label_of(Field::Dates))?,
        requirements: cells.text(label_of(Field::Requirements))?,
        description: cells.optional_text(label_of(Field::Description)),
        notes: cells.optional_text(label_of(Field::Notes)),
        status: cells.text(label_of(Field::Status))?,
        capacity: cells.count(label_of(Field::Capacity))?,
        enrolled: cells.count(label_of(Field::Enrolled))?,
        wl_capacity: cells.count(label_of(Field::WaitlistCapacity))?,
        wl_occupied: cells.count(label_of(Field::WaitlistOccupied))?,
        attributes: cells.lines(label_of(Field::Attributes)),
        meeting_days: meetings.days,
        meeting_times: meetings.times,
        meeting_dates: meetings.dates,
        instructors: meetings.instructors.into_iter().collect(),
    })
}

fn label_of(field: Field) -> &'static str {
    DETAIL_SCHEMA
        .iter()
        .find(|spec| spec.field == field)
        .map(|spec| spec.label)
        .unwrap_or("")
}

fn parse_header(html: &Html) -> Result<(String, String, String, String), ExtractionError> {
    let title_sel = Selector::parse(".classTitle, h1").unwrap();
    let text = html
        .select(&title_sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .ok_or(ExtractionError::HeaderMalformed)?;

    let caps = HEADER_RE
        .captures(&text)
        .ok_or(ExtractionError::HeaderMalformed)?;
    Ok((
        caps[1].to_owned(),
        caps[2].to_owned(),
        caps[3].to_owned(),
        caps[4].trim().to_owned(),
    ))
}

#[derive(Debug, Default)]
struct Meetings {
    days: Vec<String>,
    times: Vec<String>,
    dates: Vec<String>,
    instructors: IndexSet<String>,
}

/// Column positions in the meeting pattern table, found from its header row.
struct MeetingColumns {
    days: usize,
    time: usize,
    dates: Option<usize>,
    instructors: Option<usize>,
}

impl MeetingColumns {
    fn from_header(headers: &[String]) -> Option<Self> {
        let position = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
        Some(Self {
            days: position(&["Days"])?,
            time: position(&["Time", "Times"])?,
            dates: position(&["Dates", "Meeting Dates"]),
            instructors: position(&["Instructor(s)", "Instructors", "Instructor"]),
        })
    }
}

/// Classes without a meeting table (independent study, etc.) produce empty sequences.
fn parse_meetings(html: &Html) -> Meetings {
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();
    let mut meetings = Meetings::default();

    for table in html.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header_row
            .select(&cell_sel)
            .map(|cell| normalize_label(&cell.text().collect::<String>()))
            .collect();
        let Some(columns) = MeetingColumns::from_header(&headers) else {
            continue;
        };

        for row in rows {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            let text_at = |idx: usize| {
                cells
                    .get(idx)
                    .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                    .unwrap_or_default()
            };
            if cells.len() <= columns.days.max(columns.time) {
                continue;
            }

            meetings.days.push(text_at(columns.days));
            meetings.times.push(text_at(columns.time));
            meetings
                .dates
                .push(columns.dates.map(&text_at).unwrap_or_default());

            // "Staff" is the catalog's placeholder for an unassigned instructor
            if let Some(cell) = columns.instructors.and_then(|idx| cells.get(idx)) {
                meetings
                    .instructors
                    .extend(text_lines(*cell).into_iter().filter(|name| name != "Staff"));
            }
        }
        break;
    }

    meetings
}

/// Text nodes of an element, trimmed, one per entry. `<br>` and `<li>` separate entries.
fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .flat_map(str::lines)
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn normalize_label(raw: &str) -> String {
    collapse_whitespace(raw)
        .trim_end_matches(':')
        .trim_end()
        .to_owned()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
