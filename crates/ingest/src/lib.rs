//! Case Ingest Layer
//!
//! This is where a CRM case export enters the digest pipeline. We take the raw
//! table, reconcile its headers, resolve owners, validate fields, and hand back
//! clean [`CaseRecord`]s for the grouping stage.
//!
//! ## What we do here
//!
//! - **Read exports** - delimited text via `csv`, spreadsheets via `calamine`
//! - **Normalize the schema** - header cleanup, alias renames, owner email
//!   resolution from a static directory, manager / block-list exclusion
//! - **Validate fields** - required columns, priority enum, creation dates,
//!   case age in whole days
//! - **Report, don't fail** - row-level problems become [`IngestWarning`]s in
//!   an [`IngestReport`]; only structural problems are [`IngestError`]s
//! - **Log everything** - structured events via tracing
//!
//! ## Pipeline
//!
//! ```text
//! read_table ──► SchemaNormalizer ──► FieldValidator ──► Vec<CaseRecord>
//!  (RawTable)     (NormalizedTable)    (RowOutcome)       + IngestReport
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ingest::{ingest_table, read_delimited, IngestConfig, OwnerDirectory};
//!
//! let export = "\
//! (Do Not Modify) Case,Case Title,Owner,Created On,Priority
//! C-1,Printer offline,Jana Sweid,2024-03-14,high
//! C-2,VPN drops,Abdo Khoury,2024-03-01,Low
//! ";
//! let config = IngestConfig {
//!     owner_directory: OwnerDirectory::from_iter([("Jana Sweid", "JSweid@example.com")]),
//!     manager_owner_name: Some("Abdo Khoury".into()),
//!     ..Default::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 4, 30).expect("valid date");
//!
//! let table = read_delimited(export.as_bytes()).expect("valid csv");
//! let outcome = ingest_table(table, &config, today).expect("ingest succeeds");
//!
//! assert_eq!(outcome.cases.len(), 1);
//! assert_eq!(outcome.cases[0].owner_email, "JSweid@example.com");
//! assert_eq!(outcome.cases[0].age_days, 47);
//! assert_eq!(outcome.report.rows_excluded, 1);
//! ```
use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, warn, Level};

mod config;
mod dates;
mod error;
mod normalizer;
mod reader;
mod report;
mod types;
mod validate;

pub use crate::config::{
    normalize_header, ColumnAliasMap, ConfigError, IngestConfig, OwnerDirectory, CANONICAL_COLUMNS,
};
pub use crate::dates::{age_in_days, from_excel_serial, parse_date};
pub use crate::error::IngestError;
pub use crate::normalizer::{NormalizedTable, SchemaNormalizer};
pub use crate::reader::{read_delimited, read_table, DelimitedError, SourceFormat};
pub use crate::report::{ExclusionRule, IngestReport, IngestWarning};
pub use crate::types::{
    CaseRecord, CellValue, DropReason, Priority, RawRecord, RawTable, RowOutcome, UnknownPriority,
    AGE_DAYS, CASE_ID, CASE_TITLE, CREATED_DATE, OWNER_EMAIL, OWNER_NAME, PRIORITY,
    REQUIRED_COLUMNS,
};
pub use crate::validate::FieldValidator;

/// Result of a successful ingest run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    /// Surviving cases in source row order.
    pub cases: Vec<CaseRecord>,
    pub report: IngestReport,
}

/// Read `path` and ingest it. See [`ingest_table`].
pub fn ingest_file(
    path: &Path,
    cfg: &IngestConfig,
    today: NaiveDate,
) -> Result<IngestOutcome, IngestError> {
    let table = match read_table(path) {
        Ok(table) => table,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ingest_failure");
            return Err(err);
        }
    };
    ingest_table(table, cfg, today)
}

/// Normalize and validate an already-loaded table.
///
/// `today` is the reference date for age computation and stays fixed for the
/// whole run, so identical input and `today` give identical output.
pub fn ingest_table(
    table: RawTable,
    cfg: &IngestConfig,
    today: NaiveDate,
) -> Result<IngestOutcome, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "ingest.run",
        rows = table.len(),
        today = %today
    );
    let _guard = span.enter();

    match ingest_inner(table, cfg, today) {
        Ok(outcome) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                rows_read = outcome.report.rows_read,
                rows_excluded = outcome.report.rows_excluded,
                rows_dropped = outcome.report.rows_dropped,
                valid_rows = outcome.report.valid_rows,
                warnings = outcome.report.warnings.len(),
                elapsed_micros,
                "ingest_success"
            );
            Ok(outcome)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "ingest_failure");
            Err(err)
        }
    }
}

fn ingest_inner(
    table: RawTable,
    cfg: &IngestConfig,
    today: NaiveDate,
) -> Result<IngestOutcome, IngestError> {
    let mut report = IngestReport {
        rows_read: table.len(),
        ..Default::default()
    };

    let normalized = SchemaNormalizer::new(cfg).normalize(table, &mut report);
    let outcomes = FieldValidator::new(today).validate(normalized, &mut report)?;
    let cases = outcomes.into_iter().filter_map(RowOutcome::into_case).collect();

    Ok(IngestOutcome { cases, report })
}
