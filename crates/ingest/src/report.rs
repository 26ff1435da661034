//! Non-fatal findings collected during an ingest run.
//!
//! Every row-level problem is handled locally (defaulted, recomputed or
//! dropped) and recorded here so callers can print it, log it, or assert on
//! it. Nothing in this module affects which cases survive.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DropReason;

/// Which exclusion rule removed an owner's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionRule {
    Manager,
    Blocked,
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum IngestWarning {
    /// Two source headers collapsed onto one canonical column; the later one was ignored.
    DuplicateColumn { column: String, ignored: String },
    /// Rows owned by an excluded owner were removed.
    OwnerExcluded {
        owner: String,
        rule: ExclusionRule,
        count: usize,
    },
    /// Owner names with no directory entry. Their rows are dropped later.
    UnmappedOwners { names: Vec<String> },
    /// Priority values outside the known set were replaced with `Medium`.
    PriorityCoerced { count: usize },
    /// Explicit ages that were missing or non-numeric were recomputed from dates.
    AgeRecomputed { count: usize },
    /// Rows removed because a required value was blank.
    RowsDropped { reason: DropReason, count: usize },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestWarning::DuplicateColumn { column, ignored } => {
                write!(f, "column {ignored:?} duplicates {column:?} and was ignored")
            }
            IngestWarning::OwnerExcluded { owner, rule, count } => match rule {
                ExclusionRule::Manager => {
                    write!(f, "excluding {count} case(s) owned by {owner} (manager)")
                }
                ExclusionRule::Blocked => write!(f, "excluding {count} case(s) owned by {owner}"),
            },
            IngestWarning::UnmappedOwners { names } => write!(
                f,
                "no email mapping for owner(s): {}; these rows will be dropped",
                names.join(", ")
            ),
            IngestWarning::PriorityCoerced { count } => write!(
                f,
                "{count} row(s) have invalid priority values; defaulting to 'Medium'"
            ),
            IngestWarning::AgeRecomputed { count } => write!(
                f,
                "{count} row(s) had no usable age; computed from created_date"
            ),
            IngestWarning::RowsDropped { reason, count } => {
                write!(f, "dropped {count} row(s) with {reason}")
            }
        }
    }
}

/// Everything an ingest run observed, in the order it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Data rows read from the source.
    pub rows_read: usize,
    /// Rows removed by manager / block-list exclusion.
    pub rows_excluded: usize,
    /// Rows removed at the drop step.
    pub rows_dropped: usize,
    /// Cases that survived validation.
    pub valid_rows: usize,
    pub warnings: Vec<IngestWarning>,
}

impl IngestReport {
    pub fn push(&mut self, warning: IngestWarning) {
        self.warnings.push(warning);
    }

    /// Names reported by the unmapped-owner warning, if any.
    pub fn unmapped_owners(&self) -> &[String] {
        self.warnings
            .iter()
            .find_map(|w| match w {
                IngestWarning::UnmappedOwners { names } => Some(names.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Number of priorities replaced with `Medium`.
    pub fn priorities_coerced(&self) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                IngestWarning::PriorityCoerced { count } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Rows excluded for a particular owner, across rules.
    pub fn excluded_for(&self, owner: &str) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                IngestWarning::OwnerExcluded {
                    owner: excluded,
                    count,
                    ..
                } if excluded == owner => *count,
                _ => 0,
            })
            .sum()
    }

    /// Rows dropped for one reason.
    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                IngestWarning::RowsDropped {
                    reason: dropped,
                    count,
                } if *dropped == reason => *count,
                _ => 0,
            })
            .sum()
    }
}
