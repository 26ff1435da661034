//! Field validation and age calculation.
//!
//! Turns a [`NormalizedTable`] into per-row [`RowOutcome`]s. The steps run in
//! a fixed order and each one is applied to the whole table before the next
//! starts:
//!
//! | Step | Column | On bad data |
//! |------|--------|-------------|
//! | 1 | required set | fatal [`IngestError::MissingColumns`] |
//! | 2 | `priority` | default to `Medium`, counted |
//! | 3 | `created_date` | fatal [`IngestError::UnparseableDate`] |
//! | 4 | `age_days` | recompute from `created_date`, counted |
//! | 5 | `owner_email`, `case_id` | row dropped, counted |
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dates::{age_in_days, coerce_age, parse_date_cell};
use crate::error::IngestError;
use crate::normalizer::NormalizedTable;
use crate::report::{IngestReport, IngestWarning};
use crate::types::{
    CaseRecord, CellValue, DropReason, Priority, RawRecord, RowOutcome, AGE_DAYS, CASE_ID,
    CASE_TITLE, CREATED_DATE, OWNER_EMAIL, OWNER_NAME, PRIORITY, REQUIRED_COLUMNS,
};

/// Validates normalized rows against a fixed reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValidator {
    today: NaiveDate,
}

impl FieldValidator {
    /// `today` is the reference date for every age computed in this run.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Fails when any required canonical column is absent.
    ///
    /// Only column presence is checked; individual cells may still be blank.
    pub fn check_columns(&self, table: &NormalizedTable) -> Result<(), IngestError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !table.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(IngestError::MissingColumns {
                missing,
                found: table.columns.clone(),
            })
        }
    }

    /// Run every validation step and return one outcome per input row.
    pub fn validate(
        &self,
        table: NormalizedTable,
        report: &mut IngestReport,
    ) -> Result<Vec<RowOutcome>, IngestError> {
        self.check_columns(&table)?;

        let priorities = self.priorities(&table, report);
        let dates = self.created_dates(&table.rows)?;
        let ages = self.ages(&table, &dates, report);

        let mut outcomes = Vec::with_capacity(table.rows.len());
        let mut missing_email = 0usize;
        let mut missing_id = 0usize;

        let rows = table.rows.into_iter().zip(priorities).zip(dates).zip(ages);
        for (((row, priority), created_date), age_days) in rows {
            let outcome = match (row.non_blank_text(OWNER_EMAIL), row.non_blank_text(CASE_ID)) {
                (None, _) => {
                    missing_email += 1;
                    RowOutcome::Dropped {
                        row: row.row,
                        reason: DropReason::MissingOwnerEmail,
                    }
                }
                (Some(_), None) => {
                    missing_id += 1;
                    RowOutcome::Dropped {
                        row: row.row,
                        reason: DropReason::MissingCaseId,
                    }
                }
                (Some(owner_email), Some(case_id)) => RowOutcome::Kept(CaseRecord {
                    case_id,
                    case_title: row.text(CASE_TITLE).unwrap_or_default(),
                    owner_name: row.text(OWNER_NAME).unwrap_or_default(),
                    owner_email,
                    created_date,
                    age_days,
                    priority,
                    source_row: row.row,
                }),
            };
            outcomes.push(outcome);
        }

        for (reason, count) in [
            (DropReason::MissingOwnerEmail, missing_email),
            (DropReason::MissingCaseId, missing_id),
        ] {
            if count > 0 {
                warn!(%reason, count, "rows_dropped");
                report.push(IngestWarning::RowsDropped { reason, count });
            }
        }
        report.rows_dropped += missing_email + missing_id;
        report.valid_rows = outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Kept(_)))
            .count();
        info!(valid_rows = report.valid_rows, "valid_rows");

        Ok(outcomes)
    }

    fn priorities(&self, table: &NormalizedTable, report: &mut IngestReport) -> Vec<Priority> {
        if !table.has_column(PRIORITY) {
            return vec![Priority::default(); table.rows.len()];
        }

        let mut coerced = 0usize;
        let priorities = table
            .rows
            .iter()
            .map(|row| match row.get(PRIORITY) {
                None => Priority::default(),
                Some(cell) if cell.is_missing() => Priority::default(),
                Some(cell) => normalize_priority(cell).unwrap_or_else(|| {
                    coerced += 1;
                    Priority::default()
                }),
            })
            .collect();

        if coerced > 0 {
            warn!(count = coerced, "priority_coerced");
            report.push(IngestWarning::PriorityCoerced { count: coerced });
        }
        priorities
    }

    fn created_dates(&self, rows: &[RawRecord]) -> Result<Vec<NaiveDate>, IngestError> {
        rows.iter()
            .map(|row| {
                let cell = row.get(CREATED_DATE).cloned().unwrap_or_default();
                parse_date_cell(&cell).ok_or_else(|| IngestError::UnparseableDate {
                    row: row.row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    fn ages(&self, table: &NormalizedTable, dates: &[NaiveDate], report: &mut IngestReport) -> Vec<i64> {
        let computed = |date: &NaiveDate| age_in_days(*date, self.today);
        if !table.has_column(AGE_DAYS) {
            return dates.iter().map(computed).collect();
        }

        let mut recomputed = 0usize;
        let ages = table
            .rows
            .iter()
            .zip(dates)
            .map(|(row, date)| {
                row.get(AGE_DAYS)
                    .and_then(coerce_age)
                    .unwrap_or_else(|| {
                        recomputed += 1;
                        computed(date)
                    })
            })
            .collect();

        if recomputed > 0 {
            info!(count = recomputed, "age_recomputed");
            report.push(IngestWarning::AgeRecomputed { count: recomputed });
        }
        ages
    }
}

/// Trim, capitalize, and match against the four known priorities.
fn normalize_priority(cell: &CellValue) -> Option<Priority> {
    cell.as_trimmed_text()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("invalid date components");
        };
        date
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> NormalizedTable {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(index, values)| {
                let mut record = RawRecord::new(index + 1);
                for (column, value) in columns.iter().zip(values.iter()) {
                    record.insert(column.clone(), CellValue::text(*value));
                }
                record
            })
            .collect();
        NormalizedTable { columns, rows }
    }

    const BASE: [&str; 5] = [CASE_ID, CASE_TITLE, OWNER_NAME, OWNER_EMAIL, CREATED_DATE];

    fn with(extra: &[&'static str]) -> Vec<&'static str> {
        BASE.iter().chain(extra.iter()).copied().collect()
    }

    fn kept(outcomes: Vec<RowOutcome>) -> Vec<CaseRecord> {
        outcomes.into_iter().filter_map(RowOutcome::into_case).collect()
    }

    #[test]
    fn missing_required_columns_are_fatal_and_listed() {
        let t = table(&[CASE_ID, CASE_TITLE, OWNER_NAME, OWNER_EMAIL], &[]);
        let err = FieldValidator::new(ymd(2024, 4, 30))
            .validate(t, &mut IngestReport::default())
            .expect_err("missing created_date");
        assert_eq!(
            err,
            IngestError::MissingColumns {
                missing: vec![CREATED_DATE.into()],
                found: vec![
                    CASE_ID.into(),
                    CASE_TITLE.into(),
                    OWNER_NAME.into(),
                    OWNER_EMAIL.into()
                ],
            }
        );
    }

    #[test]
    fn priorities_normalize_and_count_coercions() {
        let t = table(
            &with(&[PRIORITY]),
            &[
                &["C-1", "a", "Jana", "j@x", "2024-04-01", "  high "],
                &["C-2", "b", "Jana", "j@x", "2024-04-01", "urgent"],
                &["C-3", "c", "Jana", "j@x", "2024-04-01", ""],
                &["C-4", "d", "Jana", "j@x", "2024-04-01", "LOW"],
            ],
        );
        let mut report = IngestReport::default();
        let cases = kept(
            FieldValidator::new(ymd(2024, 4, 30))
                .validate(t, &mut report)
                .expect("valid"),
        );
        let priorities: Vec<Priority> = cases.iter().map(|c| c.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::Medium, Priority::Medium, Priority::Low]
        );
        assert_eq!(report.priorities_coerced(), 1);
    }

    #[test]
    fn absent_priority_column_defaults_to_medium() {
        let t = table(&BASE, &[&["C-1", "a", "Jana", "j@x", "2024-04-01"]]);
        let cases = kept(
            FieldValidator::new(ymd(2024, 4, 30))
                .validate(t, &mut IngestReport::default())
                .expect("valid"),
        );
        assert_eq!(cases[0].priority, Priority::Medium);
    }

    #[test]
    fn unparseable_date_is_fatal_even_on_rows_later_dropped() {
        let t = table(
            &BASE,
            &[
                &["C-1", "a", "Jana", "j@x", "2024-04-01"],
                &["C-2", "b", "Sam", "", "someday"],
            ],
        );
        let err = FieldValidator::new(ymd(2024, 4, 30))
            .validate(t, &mut IngestReport::default())
            .expect_err("bad date");
        assert_eq!(
            err,
            IngestError::UnparseableDate {
                row: 2,
                value: "someday".into()
            }
        );
    }

    #[test]
    fn blank_created_date_is_unparseable() {
        let t = table(&BASE, &[&["C-1", "a", "Jana", "j@x", ""]]);
        let result = FieldValidator::new(ymd(2024, 4, 30)).validate(t, &mut IngestReport::default());
        assert!(matches!(result, Err(IngestError::UnparseableDate { row: 1, .. })));
    }

    #[test]
    fn ages_are_computed_without_an_explicit_column() {
        let t = table(&BASE, &[&["C-1", "a", "Jana", "j@x", "2024-03-14"]]);
        let cases = kept(
            FieldValidator::new(ymd(2024, 4, 30))
                .validate(t, &mut IngestReport::default())
                .expect("valid"),
        );
        assert_eq!(cases[0].age_days, 47);
        assert_eq!(cases[0].created_date, ymd(2024, 3, 14));
    }

    #[test]
    fn explicit_ages_win_and_gaps_are_recomputed() {
        let t = table(
            &with(&[AGE_DAYS]),
            &[
                &["C-1", "a", "Jana", "j@x", "2024-03-14", "12"],
                &["C-2", "b", "Jana", "j@x", "2024-03-14", "n/a"],
                &["C-3", "c", "Jana", "j@x", "2024-03-14", ""],
                &["C-4", "d", "Jana", "j@x", "2024-03-14", "5.8"],
            ],
        );
        let mut report = IngestReport::default();
        let cases = kept(
            FieldValidator::new(ymd(2024, 4, 30))
                .validate(t, &mut report)
                .expect("valid"),
        );
        let ages: Vec<i64> = cases.iter().map(|c| c.age_days).collect();
        assert_eq!(ages, vec![12, 47, 47, 5]);
        assert!(report
            .warnings
            .contains(&IngestWarning::AgeRecomputed { count: 2 }));
    }

    #[test]
    fn rows_without_email_or_case_id_are_dropped_with_reasons() {
        let t = table(
            &BASE,
            &[
                &["C-1", "a", "Jana", "j@x", "2024-04-01"],
                &["C-2", "b", "Sam", "", "2024-04-01"],
                &["  ", "c", "Jana", "j@x", "2024-04-01"],
            ],
        );
        let mut report = IngestReport::default();
        let outcomes = FieldValidator::new(ymd(2024, 4, 30))
            .validate(t, &mut report)
            .expect("valid");
        assert_eq!(
            outcomes[1],
            RowOutcome::Dropped {
                row: 2,
                reason: DropReason::MissingOwnerEmail
            }
        );
        assert_eq!(
            outcomes[2],
            RowOutcome::Dropped {
                row: 3,
                reason: DropReason::MissingCaseId
            }
        );
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(report.valid_rows, 1);
        assert_eq!(report.dropped_for(DropReason::MissingOwnerEmail), 1);
        assert_eq!(report.dropped_for(DropReason::MissingCaseId), 1);
    }

    #[test]
    fn kept_fields_are_trimmed() {
        let t = table(&BASE, &[&[" C-9 ", "  Printer offline ", " Jana ", "j@x", "2024-04-01"]]);
        let cases = kept(
            FieldValidator::new(ymd(2024, 4, 30))
                .validate(t, &mut IngestReport::default())
                .expect("valid"),
        );
        assert_eq!(cases[0].case_id, "C-9");
        assert_eq!(cases[0].case_title, "Printer offline");
        assert_eq!(cases[0].owner_name, "Jana");
        assert_eq!(cases[0].source_row, 1);
    }
}
