//! Loading case exports from disk.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`, `.xls`, `.ods`) are read with `calamine`,
//! first worksheet only. Everything else is treated as comma-delimited UTF-8
//! text and read with `csv`. Either way the first row is the header and rows
//! whose cells are all blank are skipped.
use std::io;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::debug;

use crate::dates::from_excel_serial;
use crate::error::IngestError;
use crate::types::{CellValue, RawTable};

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Which decoder a path is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    /// Pick a decoder from the file extension (case-insensitive).
    pub fn for_path(path: &Path) -> Self {
        let is_sheet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SPREADSHEET_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if is_sheet {
            SourceFormat::Spreadsheet
        } else {
            SourceFormat::Delimited
        }
    }
}

/// Read a case export into a [`RawTable`].
///
/// # Errors
///
/// - [`IngestError::FileNotFound`] when `path` does not exist
/// - [`IngestError::Read`] when the file cannot be opened or decoded
/// - [`IngestError::EmptyInput`] when there is no header row
pub fn read_table(path: &Path) -> Result<RawTable, IngestError> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = SourceFormat::for_path(path);
    let table = match format {
        SourceFormat::Delimited => read_delimited_file(path)?,
        SourceFormat::Spreadsheet => read_spreadsheet(path)?,
    };

    debug!(
        path = %path.display(),
        ?format,
        columns = table.columns.len(),
        rows = table.rows.len(),
        "table_loaded"
    );
    Ok(table)
}

fn read_delimited_file(path: &Path) -> Result<RawTable, IngestError> {
    let file = std::fs::File::open(path).map_err(|err| read_error(path, err))?;
    read_delimited(file).map_err(|err| match err {
        DelimitedError::Empty => IngestError::EmptyInput,
        DelimitedError::Csv(err) => read_error(path, err),
    })
}

/// Failure modes of [`read_delimited`].
#[derive(Debug, Error)]
pub enum DelimitedError {
    #[error("input has no header row")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Decode comma-delimited text from any reader.
///
/// Short rows are padded with empty cells; fully blank rows are skipped but
/// still count towards row numbering.
///
/// ```rust
/// let data = "Case Title,Owner\nPrinter offline,Jana Sweid\n,\n";
/// let table = ingest::read_delimited(data.as_bytes()).expect("valid csv");
/// assert_eq!(table.columns, vec!["Case Title", "Owner"]);
/// assert_eq!(table.len(), 1);
/// ```
pub fn read_delimited<R: io::Read>(input: R) -> Result<RawTable, DelimitedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|c| c.trim().is_empty()) {
        return Err(DelimitedError::Empty);
    }

    let mut table = RawTable::new(columns);
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        table.push_row_numbered(index + 1, record.iter().map(CellValue::text));
    }
    Ok(table)
}

fn read_spreadsheet(path: &Path) -> Result<RawTable, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| read_error(path, err))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|err| read_error(path, err))?,
        None => return Err(IngestError::EmptyInput),
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(IngestError::EmptyInput);
    };
    let columns: Vec<String> = header.iter().map(header_text).collect();
    if columns.iter().all(|c| c.trim().is_empty()) {
        return Err(IngestError::EmptyInput);
    }

    let mut table = RawTable::new(columns);
    for (index, row) in rows.enumerate() {
        let values: Vec<CellValue> = row.iter().map(cell_value).collect();
        if values.iter().all(CellValue::is_blank) {
            continue;
        }
        table.push_row_numbered(index + 1, values);
    }
    Ok(table)
}

fn header_text(cell: &Data) -> String {
    cell_value(cell).to_string()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => from_excel_serial(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.clone()),
    }
}

fn read_error(path: &Path, err: impl std::fmt::Display) -> IngestError {
    IngestError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
