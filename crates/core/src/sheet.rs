//! Tabular input for the vendor lookup table.
//!
//! The SKU map arrives as spreadsheet bytes. It is decoded once into a
//! [`Table`] of optional cell strings so the lookup table never has to know
//! about workbook formats.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use thiserror::Error;

use crate::lookup::SchemaError;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Could not read SKU map workbook: {0}")]
    Unreadable(String),
    #[error("SKU map workbook has no worksheets")]
    NoWorksheet,
    #[error("SKU map worksheet is empty (no header row)")]
    Empty,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A header row plus data rows. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Header names are trimmed; rows shorter than the header read as blank
    /// in the missing columns.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Table {
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Convenience constructor for fixtures and CSV-like input where every
    /// cell is present; empty strings become blank cells.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(Into::into)
                    .map(|cell: String| (!cell.is_empty()).then_some(cell))
                    .collect()
            })
            .collect();
        Table::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column whose (trimmed) header equals `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Decode the first worksheet of an `.xlsx` workbook. The first row is the
    /// header.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self, SheetError> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes)).map_err(|e| SheetError::Unreadable(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)?
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        let mut rows = range.rows();
        let header = rows.next().ok_or(SheetError::Empty)?;
        let headers = header
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default())
            .collect();
        let body = rows.map(|row| row.iter().map(cell_text).collect()).collect();

        Ok(Table::new(headers, body))
    }
}

/// Render a cell the way a person reading the sheet would type it.
///
/// Whole-number floats lose their fractional part so a numeric SKU `12345`
/// stays `12345` rather than becoming `12345.0` (which would normalise to a
/// different key).
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
