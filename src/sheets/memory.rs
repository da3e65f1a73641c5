//! In-process [`RangeStore`] for tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{AppendOutcome, CellRange, RangeStore, SheetError};

/// A single sheet held in memory, row-major.
pub struct MemorySheet {
    sheet_name: String,
    grid: Mutex<Vec<Vec<String>>>,
    unavailable: AtomicBool,
}

impl MemorySheet {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            grid: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// A sheet whose first row holds `header`.
    pub fn with_header<S: AsRef<str>>(sheet_name: impl Into<String>, header: &[S]) -> Self {
        let sheet = Self::new(sheet_name);
        sheet.push_row(header.iter().map(|h| h.as_ref().to_string()).collect());
        sheet
    }

    /// Append a raw row below the current grid, bypassing table detection.
    pub fn push_row(&self, row: Vec<String>) {
        if let Ok(mut grid) = self.grid.lock() {
            grid.push(row);
        }
    }

    /// Snapshot of every stored row.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.grid.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Make every call fail as if the remote store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self, range: &CellRange) -> Result<MutexGuard<'_, Vec<Vec<String>>>, SheetError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SheetError::Unavailable(format!(
                "memory sheet {} is offline",
                self.sheet_name
            )));
        }
        if let Some(ref sheet) = range.sheet {
            if *sheet != self.sheet_name {
                return Err(SheetError::InvalidRange(format!(
                    "no sheet named {} in {}",
                    sheet, range
                )));
            }
        }
        self.grid
            .lock()
            .map_err(|_| SheetError::Unavailable("memory sheet lock poisoned".to_string()))
    }
}

fn is_blank(cell: &str) -> bool {
    cell.is_empty()
}

fn write_block(grid: &mut Vec<Vec<String>>, first_row: usize, first_col: usize, rows: Vec<Vec<String>>) {
    for (i, values) in rows.into_iter().enumerate() {
        let r = first_row + i;
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        let row = &mut grid[r];
        for (j, value) in values.into_iter().enumerate() {
            let c = first_col + j;
            if row.len() <= c {
                row.resize(c + 1, String::new());
            }
            row[c] = value;
        }
    }
}

/// Last used row and column of the grid, both 1-based. `None` when empty.
fn data_extent(grid: &[Vec<String>]) -> Option<(u32, u32)> {
    let last_row = grid
        .iter()
        .rposition(|row| row.iter().any(|c| !is_blank(c)))?;
    let last_col = grid
        .iter()
        .filter_map(|row| row.iter().rposition(|c| !is_blank(c)))
        .max()?;
    Some((last_row as u32 + 1, last_col as u32 + 1))
}

#[async_trait]
impl RangeStore for MemorySheet {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_values(&self, range: &CellRange) -> Result<Vec<Vec<String>>, SheetError> {
        let grid = self.lock(range)?;
        let first_row = range.start.row.unwrap_or(1) as usize;
        let last_row = range.end.row.map(|r| r as usize).unwrap_or(grid.len());
        let lo = range.start.col as usize - 1;
        let hi = range.end.col as usize;

        let mut values: Vec<Vec<String>> = (first_row..=last_row)
            .map(|r| {
                let row = grid.get(r - 1).map(Vec::as_slice).unwrap_or(&[]);
                let end = hi.min(row.len());
                let mut cells = if lo < end {
                    row[lo..end].to_vec()
                } else {
                    Vec::new()
                };
                while cells.last().is_some_and(|c| is_blank(c)) {
                    cells.pop();
                }
                cells
            })
            .collect();

        while values.last().is_some_and(|row| row.is_empty()) {
            values.pop();
        }

        debug!("memory get {} -> {} rows", range, values.len());
        Ok(values)
    }

    async fn update_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetError> {
        let mut grid = self.lock(range)?;

        let too_tall = range.height().is_some_and(|h| rows.len() > h as usize);
        let too_wide = rows.iter().any(|row| row.len() > range.width() as usize);
        if too_tall || too_wide {
            return Err(SheetError::InvalidRange(format!(
                "values do not fit in {}",
                range
            )));
        }

        let first_row = range.start.row.unwrap_or(1) as usize - 1;
        let first_col = range.start.col as usize - 1;
        write_block(&mut grid, first_row, first_col, rows);

        debug!("memory update {}", range);
        Ok(())
    }

    async fn append_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendOutcome, SheetError> {
        let mut grid = self.lock(range)?;

        let extent = data_extent(&grid);
        let table_range = extent.map(|(last_row, last_col)| {
            CellRange::block(&self.sheet_name, 1, last_row, 1, last_col).to_string()
        });

        let next_row = extent.map(|(last_row, _)| last_row as usize).unwrap_or(0);
        // Anything below the table is blank by construction
        grid.truncate(next_row);
        write_block(&mut grid, next_row, range.start.col as usize - 1, rows);

        debug!("memory append {} -> table {:?}", range, table_range);
        Ok(AppendOutcome { table_range })
    }
}
