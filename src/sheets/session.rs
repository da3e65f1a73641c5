//! Append-only table over a [`RangeStore`].
//!
//! Row 1 of the sheet is the header; every later row is one [`Record`]. The
//! session learns the table's extent when it opens and keeps it current as it
//! grows the header and appends rows. Nothing is cached across sessions, so
//! open a fresh one per request.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::column::{column_name, column_number};
use super::{CellRange, RangeStore, SheetError};
use crate::models::Record;

/// Widest span the extent probe looks across.
const PROBE_LAST_COLUMN: &str = "ZZZ";

/// Bounds of the data currently in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    /// Last used row, 1-based. Row 1 is the header.
    pub last_row: u32,
    /// Label of the last used column.
    pub last_col: String,
}

impl Extent {
    /// `last_col` as a 1-based column number.
    pub fn last_col_number(&self) -> u32 {
        column_number(&self.last_col).unwrap_or(0)
    }
}

/// An open handle on one sheet of the store.
pub struct SheetSession {
    store: Arc<dyn RangeStore>,
    sheet_name: String,
    extent: Extent,
    columns: Vec<String>,
}

impl std::fmt::Debug for SheetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetSession")
            .field("store", &self.store.name())
            .field("sheet_name", &self.sheet_name)
            .field("extent", &self.extent)
            .field("columns", &self.columns)
            .finish()
    }
}

impl SheetSession {
    /// Discover the sheet's extent and read its header.
    pub async fn open(
        store: Arc<dyn RangeStore>,
        sheet_name: impl Into<String>,
    ) -> Result<Self, SheetError> {
        let sheet_name = sheet_name.into();
        let extent = discover_extent(store.as_ref(), &sheet_name).await?;
        let columns = read_header(store.as_ref(), &sheet_name, &extent).await?;

        // Data to the right of the header would misalign new columns and rows
        if columns.len() < extent.last_col_number() as usize {
            return Err(SheetError::Schema(format!(
                "{} has data in column {} but its header ends at column {}",
                sheet_name,
                extent.last_col,
                column_name(columns.len() as u32)
            )));
        }

        info!(
            "Opened sheet {} on {}: {} rows through column {}, {} known columns",
            sheet_name,
            store.name(),
            extent.last_row,
            extent.last_col,
            columns.len()
        );

        Ok(Self {
            store,
            sheet_name,
            extent,
            columns,
        })
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Known column names, in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Add every field not yet in the header, in the order given, to the right
    /// of the last column. Returns the names that were added.
    ///
    /// The header write happens before any in-memory state changes, so a
    /// failed write leaves the session untouched.
    pub async fn grow_columns<'f, I>(&mut self, fields: I) -> Result<Vec<String>, SheetError>
    where
        I: IntoIterator<Item = &'f str>,
    {
        let mut seen: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let mut added: Vec<String> = Vec::new();
        for field in fields {
            if seen.insert(field) {
                added.push(field.to_string());
            }
        }

        if added.is_empty() {
            return Ok(added);
        }

        let current = self.extent.last_col_number();
        let first = current + 1;
        let last = current + added.len() as u32;
        let range = CellRange::row_span(&self.sheet_name, 1, first, last);

        info!("Adding {} new columns at {}: {:?}", added.len(), range, added);
        self.store.update_values(&range, vec![added.clone()]).await?;

        self.extent.last_col = column_name(last);
        self.columns.extend(added.iter().cloned());
        Ok(added)
    }

    /// Write `record` as the next row, one cell per known column.
    ///
    /// Fields the record lacks are written empty. Every field of the record
    /// must already be a known column; call [`grow_columns`](Self::grow_columns)
    /// first.
    pub async fn append(&mut self, record: &Record) -> Result<(), SheetError> {
        let unknown = record
            .keys()
            .find(|k| !self.columns.iter().any(|c| c.as_str() == *k));
        if let Some(unknown) = unknown {
            return Err(SheetError::Schema(format!(
                "field {:?} is not a column of {}",
                unknown, self.sheet_name
            )));
        }

        let next_row = self.extent.last_row + 1;
        let range = CellRange::row_span(
            &self.sheet_name,
            next_row,
            1,
            self.extent.last_col_number(),
        );
        let values: Vec<String> = self
            .columns
            .iter()
            .map(|c| record.get(c).unwrap_or_default().to_string())
            .collect();

        debug!("Appending row at {}", range);
        self.store.update_values(&range, vec![values]).await?;

        self.extent.last_row = next_row;
        Ok(())
    }

    /// Every data row, rebuilt against the current header.
    ///
    /// Empty cells and cells missing from short rows are left out of the
    /// rebuilt records.
    pub async fn read_all(&self) -> Result<Vec<Record>, SheetError> {
        if self.extent.last_row < 2 {
            return Ok(Vec::new());
        }

        let range = CellRange::block(
            &self.sheet_name,
            2,
            self.extent.last_row,
            1,
            self.extent.last_col_number(),
        );
        let rows = self.store.get_values(&range).await?;

        let records: Vec<Record> = rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(column, value)| (column.as_str(), value.as_str()))
                    .collect::<Record>()
            })
            .collect();

        debug!("Read {} records from {}", records.len(), range);
        Ok(records)
    }
}

/// Learn the last used row and column.
///
/// Appending zero rows changes nothing, but the store still reports the range
/// of the table it would have appended to.
async fn discover_extent(store: &dyn RangeStore, sheet_name: &str) -> Result<Extent, SheetError> {
    let probe_width = column_number(PROBE_LAST_COLUMN).unwrap_or(1);
    let probe = CellRange::columns(sheet_name, 1, probe_width);
    let outcome = store.append_values(&probe, Vec::new()).await?;

    let table_range = outcome
        .table_range
        .ok_or_else(|| SheetError::Schema(format!("sheet {} has no header row", sheet_name)))?;
    let table: CellRange = table_range
        .parse()
        .map_err(|_| SheetError::Schema(format!("unreadable table range {:?}", table_range)))?;
    let last_row = table.end.row.ok_or_else(|| {
        SheetError::Schema(format!("table range {:?} has no row bound", table_range))
    })?;

    Ok(Extent {
        last_row,
        last_col: column_name(table.end.col),
    })
}

/// Read row 1 as the column set.
async fn read_header(
    store: &dyn RangeStore,
    sheet_name: &str,
    extent: &Extent,
) -> Result<Vec<String>, SheetError> {
    let range = CellRange::row_span(sheet_name, 1, 1, extent.last_col_number());
    let rows = store.get_values(&range).await?;
    let header = rows.into_iter().next().unwrap_or_default();

    if header.is_empty() {
        return Err(SheetError::Schema(format!("header row of {} is empty", sheet_name)));
    }
    if let Some(pos) = header.iter().position(|h| h.trim().is_empty()) {
        return Err(SheetError::Schema(format!(
            "header cell {}1 of {} is blank",
            column_name(pos as u32 + 1),
            sheet_name
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = header.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(SheetError::Schema(format!(
            "duplicate header {:?} in {}",
            dup, sheet_name
        )));
    }

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GAME, GAME_DATE, REQUIRED_FIELDS, SCORE_DIFFERENCE, WINNER};
    use crate::sheets::MemorySheet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn result(winner: &str, game: &str, diff: &str) -> Record {
        Record::from_iter([
            (GAME_DATE, "3/4/2024"),
            (WINNER, winner),
            (SCORE_DIFFERENCE, diff),
            (GAME, game),
        ])
    }

    fn seeded() -> Arc<MemorySheet> {
        let sheet = MemorySheet::with_header("Sheet1", &REQUIRED_FIELDS);
        sheet.push_row(strings(&["3/1/2024", "Jess", "5", "Catan"]));
        sheet.push_row(strings(&["3/2/2024", "Dan", "2", "Azul"]));
        Arc::new(sheet)
    }

    #[tokio::test]
    async fn test_open_discovers_extent_and_header() {
        let session = SheetSession::open(seeded(), "Sheet1").await.unwrap();
        assert_eq!(
            session.extent(),
            &Extent {
                last_row: 3,
                last_col: "D".to_string()
            }
        );
        assert_eq!(session.columns(), REQUIRED_FIELDS);
    }

    #[tokio::test]
    async fn test_open_empty_sheet_is_schema_error() {
        let sheet = Arc::new(MemorySheet::new("Sheet1"));
        let err = SheetSession::open(sheet, "Sheet1").await.unwrap_err();
        assert!(matches!(err, SheetError::Schema(_)));
    }

    #[tokio::test]
    async fn test_open_duplicate_header_is_schema_error() {
        let sheet = Arc::new(MemorySheet::with_header("Sheet1", &["Winner", "Winner"]));
        let err = SheetSession::open(sheet, "Sheet1").await.unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
    }

    #[tokio::test]
    async fn test_open_rejects_data_wider_than_header() {
        let sheet = seeded();
        sheet.push_row(strings(&["3/3/2024", "Dan", "2", "Azul", "", "stray"]));
        let before = sheet.rows();

        let err = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap_err();
        assert!(matches!(err, SheetError::Schema(_)));
        assert!(err.to_string().contains("column F"), "{}", err);
        // Nothing was written
        assert_eq!(sheet.rows(), before);
    }

    #[tokio::test]
    async fn test_open_unreachable_store() {
        let sheet = seeded();
        sheet.set_unavailable(true);
        let err = SheetSession::open(sheet, "Sheet1").await.unwrap_err();
        assert_eq!(err.kind(), "StoreUnavailable");
    }

    #[tokio::test]
    async fn test_grow_columns_appends_only_new_fields() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();

        let mut record = result("Jess", "Catan", "5");
        record.insert("Rainy?", "Yes");
        let added = session.grow_columns(record.keys()).await.unwrap();

        assert_eq!(added, vec!["Rainy?".to_string()]);
        assert_eq!(session.extent().last_col, "E");
        assert_eq!(
            sheet.rows()[0],
            strings(&["Game date", "Winner", "Score difference", "Game", "Rainy?"])
        );
        // Existing rows keep their positions
        assert_eq!(sheet.rows()[1], strings(&["3/1/2024", "Jess", "5", "Catan"]));
    }

    #[tokio::test]
    async fn test_grow_columns_noop_for_known_fields() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();
        let added = session
            .grow_columns(result("Dan", "Azul", "1").keys())
            .await
            .unwrap();
        assert!(added.is_empty());
        assert_eq!(session.extent().last_col, "D");
    }

    #[tokio::test]
    async fn test_grow_columns_dedups_input() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet, "Sheet1").await.unwrap();
        let added = session
            .grow_columns(["Night?", "Rainy?", "Night?"])
            .await
            .unwrap();
        assert_eq!(added, strings(&["Night?", "Rainy?"]));
        assert_eq!(session.extent().last_col, "F");
    }

    #[tokio::test]
    async fn test_grow_columns_failure_leaves_state_unchanged() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();

        sheet.set_unavailable(true);
        let err = session.grow_columns(["Rainy?"]).await.unwrap_err();
        assert_eq!(err.kind(), "StoreUnavailable");
        assert_eq!(session.extent().last_col, "D");
        assert_eq!(session.columns().len(), 4);

        sheet.set_unavailable(false);
        session.grow_columns(["Rainy?"]).await.unwrap();
        assert_eq!(session.extent().last_col, "E");
    }

    #[tokio::test]
    async fn test_append_aligns_to_columns() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();
        session.grow_columns(["Rainy?", "Night?"]).await.unwrap();

        let mut record = Record::new();
        record.insert("Night?", "Yes");
        record.insert(GAME, "Catan");
        record.insert(WINNER, "Dan");
        session.append(&record).await.unwrap();

        assert_eq!(session.extent().last_row, 4);
        assert_eq!(sheet.rows()[3], strings(&["", "Dan", "", "Catan", "", "Yes"]));
    }

    #[tokio::test]
    async fn test_append_rejects_unknown_field() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();

        let mut record = result("Jess", "Catan", "5");
        record.insert("Rainy?", "Yes");
        let err = session.append(&record).await.unwrap_err();

        assert!(matches!(err, SheetError::Schema(_)));
        assert_eq!(session.extent().last_row, 3);
        assert_eq!(sheet.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_append_failure_keeps_last_row() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();
        sheet.set_unavailable(true);
        assert!(session.append(&result("Jess", "Catan", "5")).await.is_err());
        assert_eq!(session.extent().last_row, 3);
    }

    #[tokio::test]
    async fn test_read_all_rebuilds_records() {
        let sheet = seeded();
        let mut session = SheetSession::open(sheet, "Sheet1").await.unwrap();
        session.grow_columns(["Rainy?"]).await.unwrap();

        let mut rainy = result("Dan", "Catan", "7");
        rainy.insert("Rainy?", "Yes");
        session.append(&rainy).await.unwrap();

        let records = session.read_all().await.unwrap();
        assert_eq!(records.len(), 3);
        let mut first = result("Jess", "Catan", "5");
        first.insert(GAME_DATE, "3/1/2024");
        assert_eq!(records[0], first);
        assert_eq!(records[1].winner(), Some("Dan"));
        assert_eq!(records[1].get("Rainy?"), None);
        assert_eq!(records[2], rainy);
    }

    #[tokio::test]
    async fn test_read_all_header_only() {
        let sheet = Arc::new(MemorySheet::with_header("Sheet1", &REQUIRED_FIELDS));
        let session = SheetSession::open(sheet, "Sheet1").await.unwrap();
        assert_eq!(session.extent().last_row, 1);
        assert!(session.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_sees_previous_writes() {
        let sheet = seeded();
        {
            let mut session = SheetSession::open(sheet.clone(), "Sheet1").await.unwrap();
            let mut record = result("Jess", "Azul", "3");
            record.insert("Night?", "Yes");
            session.grow_columns(record.keys()).await.unwrap();
            session.append(&record).await.unwrap();
        }

        let session = SheetSession::open(sheet, "Sheet1").await.unwrap();
        assert_eq!(session.extent().last_row, 4);
        assert_eq!(session.extent().last_col, "E");
        assert_eq!(session.columns().last().map(String::as_str), Some("Night?"));
    }
}
