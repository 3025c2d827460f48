//! Untyped grid cell values.
//!
//! A `Cell` is what a tabular store hands back for one grid position:
//! a boolean, a number, a date-time, free text, or nothing. The methods
//! here are the only place cell values are coerced into event fields;
//! everything past this boundary is typed.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One cell of a grid row.
///
/// Serialized untagged so a grid file reads as a natural JSON 2D array:
/// `null`, `true`, `3.5`, `"2024-03-01T10:00:00"`, `"some text"`.
/// Variant order matters: date-like strings must be tried before `Text`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

/// Formats tried when a date lands in a cell as text. The first two are
/// the locale form `to_row` writes for all-day dates; the rest cover
/// hand-entered and ISO-ish values.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

impl Cell {
    /// True for `Empty` and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell's content as display text (empty string for `Empty`).
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::DateTime(dt) => dt.format("%-m/%-d/%Y %H:%M").to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Coerce the cell into a date-time, or `None` if it does not hold
    /// one. Unparseable text and the number zero are `None`, never an
    /// error. Nonzero numbers are read as epoch milliseconds.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(n) if *n != 0.0 && n.is_finite() => {
                chrono::DateTime::from_timestamp_millis(*n as i64).map(|dt| dt.naive_utc())
            }
            Cell::Text(s) => parse_date_text(s),
            _ => None,
        }
    }
}

pub(crate) fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_deserializes_natural_json_values() {
        let cells: Vec<Cell> =
            serde_json::from_str(r#"[null, true, 3.5, "2024-03-01T10:00:00", "abc"]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                Cell::Empty,
                Cell::Bool(true),
                Cell::Number(3.5),
                Cell::DateTime(dt(2024, 3, 1, 10, 0)),
                Cell::Text("abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_serializes_back_to_natural_json() {
        let json = serde_json::to_string(&vec![
            Cell::Empty,
            Cell::Bool(false),
            Cell::Text("Meeting".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,false,"Meeting"]"#);
    }

    #[test]
    fn test_unparseable_date_cells_are_none() {
        assert_eq!(Cell::Text("abc".to_string()).date_time(), None);
        assert_eq!(Cell::Number(0.0).date_time(), None);
        assert_eq!(Cell::Empty.date_time(), None);
        assert_eq!(Cell::Bool(true).date_time(), None);
    }

    #[test]
    fn test_locale_date_text_parses_to_midnight() {
        assert_eq!(
            Cell::Text("3/1/2024".to_string()).date_time(),
            Some(dt(2024, 3, 1, 0, 0))
        );
        assert_eq!(
            Cell::Text("2024-03-01 10:30".to_string()).date_time(),
            Some(dt(2024, 3, 1, 10, 30))
        );
    }

    #[test]
    fn test_nonzero_number_reads_as_epoch_millis() {
        // 2024-01-01T00:00:00Z
        let cell = Cell::Number(1_704_067_200_000.0);
        assert_eq!(cell.date_time(), Some(dt(2024, 1, 1, 0, 0)));
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(Cell::Bool(true).text(), "TRUE");
        assert_eq!(Cell::Number(42.0).text(), "42");
        assert_eq!(Cell::Number(1.5).text(), "1.5");
        assert_eq!(Cell::Empty.text(), "");
    }

    #[test]
    fn test_blankness() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("  ".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }
}
