use calamine::{open_workbook_auto_from_rs, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PREVIEW_ROWS: usize = 25;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("unsupported spreadsheet type '{0}' (expected csv, xlsx, xls, xlsb or ods)")]
    Unsupported(String),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("spreadsheet is empty")]
    Empty,
}

/// Header plus the first rows of the first sheet of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetPreview {
    pub file_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SpreadsheetPreview {
    /// `(rows, columns)` of the truncated preview.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

pub fn load_preview(file_name: &str, bytes: &[u8], max_rows: usize) -> Result<SpreadsheetPreview, SpreadsheetError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let records = match extension.as_str() {
        "csv" => read_csv(bytes, max_rows)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(bytes, max_rows)?,
        _ => return Err(SpreadsheetError::Unsupported(extension)),
    };

    let mut records = records.into_iter();
    let columns = records.next().ok_or(SpreadsheetError::Empty)?;
    let rows = records
        .map(|mut row| {
            row.resize(columns.len(), String::new());
            row
        })
        .collect();

    Ok(SpreadsheetPreview {
        file_name: file_name.to_string(),
        columns,
        rows,
    })
}

fn read_csv(bytes: &[u8], max_rows: usize) -> Result<Vec<Vec<String>>, SpreadsheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for record in reader.records().take(max_rows.saturating_add(1)) {
        let record = record?;
        records.push(record.iter().map(|field| field.trim().to_string()).collect());
    }
    Ok(records)
}

fn read_workbook(bytes: &[u8], max_rows: usize) -> Result<Vec<Vec<String>>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(SpreadsheetError::NoSheets)??;

    Ok(range
        .rows()
        .take(max_rows.saturating_add(1))
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}
