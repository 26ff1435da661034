//! Error types produced by the ingest crate.
//!
//! Every variant here is fatal for a run: the export cannot be turned into
//! case records and nothing downstream should happen. Row-level problems are
//! never errors; they are reported as [`IngestWarning`](crate::IngestWarning)
//! values instead.
//!
//! # Error Categories
//!
//! | Error | Stage | Description |
//! |-------|-------|-------------|
//! | [`FileNotFound`](IngestError::FileNotFound) | Reader | Input path does not exist |
//! | [`Read`](IngestError::Read) | Reader | File exists but could not be read or parsed |
//! | [`EmptyInput`](IngestError::EmptyInput) | Reader | No header row |
//! | [`MissingColumns`](IngestError::MissingColumns) | Validator | Required columns absent after normalization |
//! | [`UnparseableDate`](IngestError::UnparseableDate) | Validator | A `created_date` value could not be parsed |
//!
//! # Examples
//!
//! ```rust
//! use ingest::IngestError;
//!
//! let err = IngestError::MissingColumns {
//!     missing: vec!["created_date".into()],
//!     found: vec!["case_id".into(), "owner_name".into()],
//! };
//! assert!(err.to_string().contains("created_date"));
//! ```
use std::path::PathBuf;

use thiserror::Error;

/// Fatal ingest failures.
///
/// The enum is `Clone + PartialEq` so callers and tests can compare outcomes
/// directly. It is `#[non_exhaustive]`; match with a catch-all arm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The input path does not exist.
    #[error("input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be opened or decoded.
    #[error("could not read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The export has no header row.
    #[error("input has no header row")]
    EmptyInput,

    /// Required canonical columns are absent after normalization.
    #[error("input is missing required column(s): {}; found columns: {}", .missing.join(", "), .found.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// A `created_date` value could not be parsed.
    ///
    /// There is no per-row recovery for this field; one bad value aborts the run.
    #[error("could not parse created_date {value:?} in row {row}; use a recognised date format such as YYYY-MM-DD")]
    UnparseableDate { row: usize, value: String },
}

impl IngestError {
    /// Errors the user can fix by changing the input file (as opposed to the
    /// file simply not being there).
    pub fn is_input_error(&self) -> bool {
        !matches!(self, IngestError::FileNotFound { .. })
    }
}
