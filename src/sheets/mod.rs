//! Spreadsheet-backed tabular storage.
//!
//! The remote store only understands range-addressed operations (get, update,
//! append). [`RangeStore`] is that surface; [`SheetSession`] layers the
//! append-only table on top of it:
//!
//! - **column**: 1-based column numbers ⇄ `A..Z, AA..` labels
//! - **range**: A1-notation range parsing and formatting
//! - **session**: extent discovery, header growth, row append, full reads
//! - **memory**: in-process store with the same range semantics
//! - **google**: Google Sheets v4 REST backend

pub mod column;
pub mod google;
pub mod memory;
pub mod range;
pub mod session;

use async_trait::async_trait;
use thiserror::Error;

pub use column::{column_name, column_number};
pub use google::{GoogleSheetsClient, GoogleSheetsConfig};
pub use memory::MemorySheet;
pub use range::{CellRange, CellRef};
pub use session::{Extent, SheetSession};

/// Errors from the tabular store.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed sheet: {0}")]
    Schema(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),
}

impl SheetError {
    /// Short kind name shown to users in error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            SheetError::Unavailable(_) => "StoreUnavailable",
            SheetError::Schema(_) | SheetError::InvalidRange(_) => "SchemaError",
        }
    }
}

/// Result of an append call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Range of the table the rows were appended after, in A1 notation.
    /// Absent when the sheet held no data at all.
    pub table_range: Option<String>,
}

/// A remote grid reachable only through range-addressed calls.
///
/// Values are row-major. Reads omit trailing empty cells of each row and
/// trailing empty rows, the way the remote store does.
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Read the values inside `range`.
    async fn get_values(&self, range: &CellRange) -> Result<Vec<Vec<String>>, SheetError>;

    /// Overwrite cells starting at the top-left corner of `range`.
    async fn update_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetError>;

    /// Append rows after the data table found within `range`.
    async fn append_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendOutcome, SheetError>;
}
