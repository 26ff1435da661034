//! Core data model types for the ingest crate.
//!
//! These types describe the shape of a case export as it is read from disk and
//! the canonical case records that flow to the grouping stage.
//!
//! # Type Hierarchy
//!
//! ```text
//! RawTable
//! ├── columns: Vec<String>          (header row, as written in the export)
//! └── rows: Vec<RawRecord>
//!     ├── row: usize                (1-based data row)
//!     └── cells: HashMap<String, CellValue>
//!
//!         ↓ SchemaNormalizer::normalize()
//!
//! NormalizedTable
//! ├── columns: Vec<String>          (canonical names, owner_email derived)
//! └── rows: Vec<RawRecord>
//!
//!         ↓ validate()
//!
//! Vec<RowOutcome>
//! ├── Kept(CaseRecord)
//! └── Dropped { row, reason: DropReason }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use ingest::{CellValue, RawRecord};
//!
//! let mut record = RawRecord::new(1);
//! record.insert("Case Title", CellValue::text("Printer offline"));
//!
//! assert_eq!(record.text("Case Title").as_deref(), Some("Printer offline"));
//! assert!(record.get("Owner").is_none());
//! ```
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical column holding the CRM case identifier.
pub const CASE_ID: &str = "case_id";
/// Canonical column holding the case title.
pub const CASE_TITLE: &str = "case_title";
/// Canonical column holding the owner display name.
pub const OWNER_NAME: &str = "owner_name";
/// Derived column holding the directory-resolved owner email.
pub const OWNER_EMAIL: &str = "owner_email";
/// Canonical column holding the creation date.
pub const CREATED_DATE: &str = "created_date";
/// Optional canonical column holding an explicit age in days.
pub const AGE_DAYS: &str = "age_days";
/// Optional canonical column holding the case priority.
pub const PRIORITY: &str = "priority";

/// Columns that must exist after normalization, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 5] = [CASE_ID, CASE_TITLE, OWNER_NAME, OWNER_EMAIL, CREATED_DATE];

/// One scalar cell from the export.
///
/// Delimited text only ever produces `Empty` and `Text`; spreadsheets may also
/// produce `Number` and `Date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Blank cell. Plays the role of a missing value everywhere downstream.
    #[default]
    Empty,
    /// Textual cell, untrimmed.
    Text(String),
    /// Numeric cell (spreadsheet sources).
    Number(f64),
    /// Native date cell (spreadsheet sources).
    Date(NaiveDate),
}

impl CellValue {
    /// Build a text cell, mapping the empty string to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// True for `Empty` cells and for text cells that hold only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Date(_) => false,
        }
    }

    /// True only for `Empty`. Whitespace-only text is *present* but blank.
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Empty) || matches!(self, CellValue::Number(n) if n.is_nan())
    }

    /// Render the cell as trimmed text. Integral numbers print without a
    /// fractional part so spreadsheet IDs like `1042.0` come out as `1042`.
    pub fn as_trimmed_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => f.write_str(""),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// One row as read from the source file.
///
/// Column names are whatever the table currently uses: raw header text before
/// normalization, canonical names after. Absent keys read as missing cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based data row number (header excluded), kept for diagnostics.
    pub row: usize,
    /// Column name → cell.
    pub cells: HashMap<String, CellValue>,
}

impl RawRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            cells: HashMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Trimmed text of a cell; `None` when the column is absent or the cell is missing.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(CellValue::as_trimmed_text)
    }

    /// Like [`RawRecord::text`] but also treats whitespace-only values as absent.
    pub fn non_blank_text(&self, column: &str) -> Option<String> {
        self.text(column).filter(|s| !s.is_empty())
    }

    /// True when every cell in the row is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

/// A whole export: header plus data rows, in file order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row built from positional values. Missing trailing values read
    /// as [`CellValue::Empty`]; extra values beyond the header are ignored.
    pub fn push_row(&mut self, values: impl IntoIterator<Item = CellValue>) {
        let row = self.rows.len() + 1;
        self.push_row_numbered(row, values);
    }

    /// Like [`RawTable::push_row`] with an explicit data-row number, for
    /// readers that skip blank lines but still want file-accurate diagnostics.
    pub fn push_row_numbered(&mut self, row: usize, values: impl IntoIterator<Item = CellValue>) {
        let mut record = RawRecord::new(row);
        let mut values = values.into_iter();
        for column in &self.columns {
            let value = values.next().unwrap_or_default();
            // Duplicate headers keep the left-most cell; the normalizer reports them.
            record.cells.entry(column.clone()).or_insert(value);
        }
        self.rows.push(record);
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Case priority. Anything unrecognised normalizes to [`Priority::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    Normal,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four priority names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

impl fmt::Display for UnknownPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown priority {:?}", self.0)
    }
}

impl std::error::Error for UnknownPriority {}

impl FromStr for Priority {
    type Err = UnknownPriority;

    /// Trims, then matches case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match capitalize(s.trim()).as_str() {
            "High" => Ok(Priority::High),
            "Normal" => Ok(Priority::Normal),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            _ => Err(UnknownPriority(s.to_string())),
        }
    }
}

/// First character upper-cased, the rest lower-cased.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// A validated case, ready for grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: String,
    pub case_title: String,
    /// Trimmed owner name exactly as it matched the directory.
    pub owner_name: String,
    pub owner_email: String,
    pub created_date: NaiveDate,
    pub age_days: i64,
    pub priority: Priority,
    /// 1-based data row the case came from.
    pub source_row: usize,
}

/// Why a row was removed at the drop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    MissingOwnerEmail,
    MissingCaseId,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingOwnerEmail => f.write_str("missing owner_email"),
            DropReason::MissingCaseId => f.write_str("missing case_id"),
        }
    }
}

/// Per-row result of validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    Kept(CaseRecord),
    Dropped { row: usize, reason: DropReason },
}

impl RowOutcome {
    pub fn into_case(self) -> Option<CaseRecord> {
        match self {
            RowOutcome::Kept(case) => Some(case),
            RowOutcome::Dropped { .. } => None,
        }
    }
}
