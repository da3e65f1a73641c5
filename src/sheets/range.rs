//! A1-notation ranges.
//!
//! Supports the shapes the remote store speaks: `Sheet1!A1:D10`, `A1:D1`,
//! single cells (`Sheet1!A1`) and whole-column spans (`Sheet1!A:ZZZ`).
//! Sheet names that are not plain identifiers are single-quoted, with
//! embedded quotes doubled.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::column::{column_name, column_number};
use super::SheetError;

static A1_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<sheet>'(?:[^']|'')+'|[^!']+)!)?(?P<c1>[A-Z]+)(?P<r1>\d+)?(?::(?P<c2>[A-Z]+)(?P<r2>\d+)?)?$",
    )
    .unwrap()
});

/// One corner of a range. A missing row means the whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: Option<u32>,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row: Some(row),
        }
    }

    pub fn column(col: u32) -> Self {
        Self { col, row: None }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", column_name(self.col))?;
        if let Some(row) = self.row {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// A rectangular range, optionally scoped to a named sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: Option<String>,
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(sheet: Option<&str>, start: CellRef, end: CellRef) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            start,
            end,
        }
    }

    /// Columns `first_col..=last_col` of a single row.
    pub fn row_span(sheet: &str, row: u32, first_col: u32, last_col: u32) -> Self {
        Self::new(
            Some(sheet),
            CellRef::new(first_col, row),
            CellRef::new(last_col, row),
        )
    }

    /// Columns `first_col..=last_col` of rows `first_row..=last_row`.
    pub fn block(sheet: &str, first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> Self {
        Self::new(
            Some(sheet),
            CellRef::new(first_col, first_row),
            CellRef::new(last_col, last_row),
        )
    }

    /// Whole columns `first_col..=last_col`, every row.
    pub fn columns(sheet: &str, first_col: u32, last_col: u32) -> Self {
        Self::new(
            Some(sheet),
            CellRef::column(first_col),
            CellRef::column(last_col),
        )
    }

    pub fn width(&self) -> u32 {
        self.end.col + 1 - self.start.col
    }

    /// Number of rows, or `None` for whole-column spans.
    pub fn height(&self) -> Option<u32> {
        match (self.start.row, self.end.row) {
            (Some(first), Some(last)) => Some(last + 1 - first),
            _ => None,
        }
    }
}

fn quote_sheet(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn unquote_sheet(raw: &str) -> String {
    match raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => raw.to_string(),
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref sheet) = self.sheet {
            write!(f, "{}!", quote_sheet(sheet))?;
        }
        if self.start == self.end && self.start.row.is_some() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SheetError::InvalidRange(s.to_string());
        let caps = A1_RANGE.captures(s.trim()).ok_or_else(invalid)?;

        let row = |name: &str| -> Result<Option<u32>, SheetError> {
            match caps.name(name) {
                Some(m) => match m.as_str().parse::<u32>() {
                    Ok(n) if n > 0 => Ok(Some(n)),
                    _ => Err(invalid()),
                },
                None => Ok(None),
            }
        };

        let c1 = column_number(&caps["c1"]).ok_or_else(invalid)?;
        let r1 = row("r1")?;
        let (c2, r2) = match caps.name("c2") {
            Some(m) => (column_number(m.as_str()).ok_or_else(invalid)?, row("r2")?),
            None => (c1, r1),
        };

        // Either both corners name a row or neither does
        if r1.is_some() != r2.is_some() || c2 < c1 {
            return Err(invalid());
        }
        if let (Some(first), Some(last)) = (r1, r2) {
            if last < first {
                return Err(invalid());
            }
        }

        Ok(Self {
            sheet: caps.name("sheet").map(|m| unquote_sheet(m.as_str())),
            start: CellRef { col: c1, row: r1 },
            end: CellRef { col: c2, row: r2 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_range() {
        let range: CellRange = "Sheet1!A1:D10".parse().unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(range.start, CellRef::new(1, 1));
        assert_eq!(range.end, CellRef::new(4, 10));
        assert_eq!(range.width(), 4);
        assert_eq!(range.height(), Some(10));
    }

    #[test]
    fn test_parse_without_sheet() {
        let range: CellRange = "A1:AB1".parse().unwrap();
        assert_eq!(range.sheet, None);
        assert_eq!(range.end, CellRef::new(28, 1));
    }

    #[test]
    fn test_parse_single_cell() {
        let range: CellRange = "Sheet1!A1".parse().unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.to_string(), "Sheet1!A1");
    }

    #[test]
    fn test_parse_whole_columns() {
        let range: CellRange = "Sheet1!A:ZZZ".parse().unwrap();
        assert_eq!(range.start, CellRef::column(1));
        assert_eq!(range.end, CellRef::column(18278));
        assert_eq!(range.height(), None);
    }

    #[test]
    fn test_parse_quoted_sheet() {
        let range: CellRange = "'Game Log'!B2:C3".parse().unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Game Log"));

        let range: CellRange = "'Jess''s games'!A1:A2".parse().unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Jess's games"));
        assert_eq!(range.to_string(), "'Jess''s games'!A1:A2");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "Sheet1!", "Sheet1!1:2", "A0:B1", "B1:A1", "A2:A1", "A1:B", "a1:b2"] {
            assert!(bad.parse::<CellRange>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["Sheet1!A1:D10", "Sheet1!A:ZZZ", "A2:C7", "'My Sheet'!AA1:AB1"] {
            let range: CellRange = text.parse().unwrap();
            assert_eq!(range.to_string(), text);
        }
    }

    #[test]
    fn test_constructors() {
        assert_eq!(CellRange::row_span("Sheet1", 5, 1, 3).to_string(), "Sheet1!A5:C5");
        assert_eq!(CellRange::block("Sheet1", 2, 9, 1, 27).to_string(), "Sheet1!A2:AA9");
        assert_eq!(CellRange::columns("Sheet1", 1, 18278).to_string(), "Sheet1!A:ZZZ");
    }
}
