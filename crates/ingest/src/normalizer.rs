//! Schema normalization: header reconciliation, owner resolution, exclusions.
//!
//! # Flow
//!
//! ```text
//! RawTable (export headers)
//!        │
//!        ▼
//! ┌──────────────────────────────────┐
//! │ 1. Normalize headers             │
//! │    trim, lower-case, '_' spaces  │
//! ├──────────────────────────────────┤
//! │ 2. Apply column aliases          │
//! │    first header per name wins    │
//! ├──────────────────────────────────┤
//! │ 3. Resolve owner_email           │
//! │    trimmed owner_name → directory│
//! ├──────────────────────────────────┤
//! │ 4. Exclude manager / blocked     │
//! ├──────────────────────────────────┤
//! │ 5. Report unmapped owners        │
//! └──────────────────────────────────┘
//!        │
//!        ▼
//! NormalizedTable (canonical headers)
//! ```
//!
//! Nothing here fails. Missing columns are the validator's business; this
//! stage only reshapes and reports.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{normalize_header, ColumnAliasMap, IngestConfig, OwnerDirectory};
use crate::report::{ExclusionRule, IngestReport, IngestWarning};
use crate::types::{CellValue, RawRecord, RawTable, OWNER_EMAIL, OWNER_NAME};

/// Rows keyed by canonical column names, with `owner_email` derived.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Canonical column names in source order; `owner_email` is appended when
    /// an `owner_name` column exists.
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl NormalizedTable {
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

/// Maps export rows onto the canonical shape using the configured lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct SchemaNormalizer<'a> {
    aliases: &'a ColumnAliasMap,
    directory: &'a OwnerDirectory,
    manager: Option<&'a str>,
    blocked: &'a [String],
}

impl<'a> SchemaNormalizer<'a> {
    pub fn new(cfg: &'a IngestConfig) -> Self {
        Self {
            aliases: &cfg.column_aliases,
            directory: &cfg.owner_directory,
            manager: cfg.manager_owner_name.as_deref().map(str::trim),
            blocked: &cfg.blocked_owners,
        }
    }

    /// Pair each source header with the canonical name it is kept under.
    ///
    /// Headers that collapse onto an already-claimed name are dropped with a
    /// [`IngestWarning::DuplicateColumn`]. A source `owner_email` column is
    /// never kept; that value is always derived from the directory.
    pub fn plan_columns(&self, columns: &[String], report: &mut IngestReport) -> Vec<(String, String)> {
        let mut plan: Vec<(String, String)> = Vec::with_capacity(columns.len());
        for source in columns {
            let normalized = normalize_header(source);
            let canonical = self.aliases.resolve(&normalized).to_string();
            if canonical == OWNER_EMAIL {
                debug!(column = %source, "source_owner_email_ignored");
                continue;
            }
            if let Some((kept, _)) = plan.iter().find(|(_, name)| *name == canonical) {
                warn!(column = %canonical, kept = %kept, ignored = %source, "duplicate_column");
                report.push(IngestWarning::DuplicateColumn {
                    column: canonical,
                    ignored: source.clone(),
                });
                continue;
            }
            plan.push((source.clone(), canonical));
        }
        plan
    }

    /// Reshape `table` onto canonical columns, resolve owners, apply exclusions.
    pub fn normalize(&self, table: RawTable, report: &mut IngestReport) -> NormalizedTable {
        let plan = self.plan_columns(&table.columns, report);
        let mut columns: Vec<String> = plan.iter().map(|(_, canonical)| canonical.clone()).collect();
        let has_owner = columns.iter().any(|c| c == OWNER_NAME);
        if has_owner {
            columns.push(OWNER_EMAIL.to_string());
        }

        let mut rows: Vec<RawRecord> = table
            .rows
            .into_iter()
            .map(|row| self.rename_row(row, &plan, has_owner))
            .collect();

        if has_owner {
            rows = self.apply_exclusions(rows, report);
            self.report_unmapped(&rows, report);
        }

        NormalizedTable { columns, rows }
    }

    fn rename_row(&self, mut row: RawRecord, plan: &[(String, String)], has_owner: bool) -> RawRecord {
        let mut out = RawRecord::new(row.row);
        for (source, canonical) in plan {
            let cell = row.cells.remove(source).unwrap_or_default();
            out.insert(canonical.clone(), cell);
        }

        if has_owner {
            let owner = out.non_blank_text(OWNER_NAME);
            let email = owner
                .as_deref()
                .and_then(|name| self.directory.lookup(name))
                .map(|email| CellValue::Text(email.to_string()))
                .unwrap_or_default();
            out.insert(OWNER_NAME, owner.map(CellValue::Text).unwrap_or_default());
            out.insert(OWNER_EMAIL, email);
        }
        out
    }

    fn apply_exclusions(&self, mut rows: Vec<RawRecord>, report: &mut IngestReport) -> Vec<RawRecord> {
        let rules = self
            .manager
            .map(|name| (name, ExclusionRule::Manager))
            .into_iter()
            .chain(self.blocked.iter().map(|name| (name.trim(), ExclusionRule::Blocked)));

        for (owner, rule) in rules {
            let before = rows.len();
            rows.retain(|row| row.text(OWNER_NAME).as_deref() != Some(owner));
            let count = before - rows.len();
            if count > 0 {
                info!(owner = %owner, ?rule, count, "owner_excluded");
                report.rows_excluded += count;
                report.push(IngestWarning::OwnerExcluded {
                    owner: owner.to_string(),
                    rule,
                    count,
                });
            }
        }
        rows
    }

    fn report_unmapped(&self, rows: &[RawRecord], report: &mut IngestReport) {
        let mut seen = HashSet::new();
        let names: Vec<String> = rows
            .iter()
            .filter(|row| row.non_blank_text(OWNER_EMAIL).is_none())
            .filter_map(|row| row.non_blank_text(OWNER_NAME))
            .filter(|name| seen.insert(name.clone()))
            .collect();

        if !names.is_empty() {
            warn!(owners = ?names, "unmapped_owners");
            report.push(IngestWarning::UnmappedOwners { names });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CASE_ID, CASE_TITLE, CREATED_DATE};

    fn config() -> IngestConfig {
        IngestConfig {
            owner_directory: OwnerDirectory::from_iter([
                ("Jana Sweid", "JSweid@example.com"),
                ("Fadi Hanna", "FHanna@example.com"),
            ]),
            manager_owner_name: Some("Abdo Khoury".into()),
            blocked_owners: vec!["Raji Aoun".into()],
            ..Default::default()
        }
    }

    fn export(rows: &[[&str; 4]]) -> RawTable {
        let mut table = RawTable::new(vec![
            "(Do Not Modify) Case".into(),
            " Title ".into(),
            "Owner".into(),
            "Created On".into(),
        ]);
        for row in rows {
            table.push_row(row.iter().map(|v| CellValue::text(*v)));
        }
        table
    }

    #[test]
    fn headers_are_normalized_and_aliased() {
        let cfg = config();
        let mut report = IngestReport::default();
        let out = SchemaNormalizer::new(&cfg).normalize(
            export(&[["C-1", "Printer", "Jana Sweid", "2024-01-01"]]),
            &mut report,
        );
        assert_eq!(
            out.columns,
            vec![CASE_ID, CASE_TITLE, OWNER_NAME, CREATED_DATE, OWNER_EMAIL]
        );
        assert_eq!(out.rows[0].text(CASE_ID).as_deref(), Some("C-1"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn unmapped_columns_pass_through() {
        let cfg = config();
        let mut table = RawTable::new(vec!["Status Reason".into(), "Owner".into()]);
        table.push_row([CellValue::text("Waiting"), CellValue::text("Jana Sweid")]);
        let out = SchemaNormalizer::new(&cfg).normalize(table, &mut IngestReport::default());
        assert_eq!(out.columns, vec!["status_reason", OWNER_NAME, OWNER_EMAIL]);
        assert_eq!(out.rows[0].text("status_reason").as_deref(), Some("Waiting"));
    }

    #[test]
    fn owner_email_resolves_from_trimmed_name() {
        let cfg = config();
        let out = SchemaNormalizer::new(&cfg).normalize(
            export(&[["C-1", "Printer", "  Jana Sweid ", "2024-01-01"]]),
            &mut IngestReport::default(),
        );
        assert_eq!(out.rows[0].text(OWNER_NAME).as_deref(), Some("Jana Sweid"));
        assert_eq!(
            out.rows[0].text(OWNER_EMAIL).as_deref(),
            Some("JSweid@example.com")
        );
    }

    #[test]
    fn source_owner_email_is_replaced_by_directory_value() {
        let cfg = config();
        let mut table = RawTable::new(vec!["Owner".into(), "Owner Email".into()]);
        table.push_row([CellValue::text("Nobody Known"), CellValue::text("spoof@example.com")]);
        let out = SchemaNormalizer::new(&cfg).normalize(table, &mut IngestReport::default());
        assert_eq!(out.rows[0].get(OWNER_EMAIL), Some(&CellValue::Empty));
    }

    #[test]
    fn manager_and_blocked_rows_are_excluded_with_counts() {
        let cfg = config();
        let mut report = IngestReport::default();
        let out = SchemaNormalizer::new(&cfg).normalize(
            export(&[
                ["C-1", "a", "Abdo Khoury", "2024-01-01"],
                ["C-2", "b", "Raji Aoun", "2024-01-01"],
                ["C-3", "c", "Jana Sweid", "2024-01-01"],
                ["C-4", "d", " Abdo Khoury", "2024-01-01"],
            ]),
            &mut report,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0].text(CASE_ID).as_deref(), Some("C-3"));
        assert_eq!(report.excluded_for("Abdo Khoury"), 2);
        assert_eq!(report.excluded_for("Raji Aoun"), 1);
        assert_eq!(report.rows_excluded, 3);
    }

    #[test]
    fn unmapped_owners_are_reported_once_in_first_seen_order() {
        let cfg = config();
        let mut report = IngestReport::default();
        let out = SchemaNormalizer::new(&cfg).normalize(
            export(&[
                ["C-1", "a", "Sam Doe", "2024-01-01"],
                ["C-2", "b", "Lee Park", "2024-01-01"],
                ["C-3", "c", "Sam Doe", "2024-01-01"],
                ["C-4", "d", "", "2024-01-01"],
            ]),
            &mut report,
        );
        // Rows stay; the validator drops them.
        assert_eq!(out.len(), 4);
        assert_eq!(report.unmapped_owners(), ["Sam Doe", "Lee Park"]);
    }

    #[test]
    fn duplicate_canonical_columns_keep_the_first() {
        let cfg = config();
        let mut table = RawTable::new(vec!["Title".into(), "Case Title".into()]);
        table.push_row([CellValue::text("first"), CellValue::text("second")]);
        let mut report = IngestReport::default();
        let out = SchemaNormalizer::new(&cfg).normalize(table, &mut report);
        assert_eq!(out.columns, vec![CASE_TITLE]);
        assert_eq!(out.rows[0].text(CASE_TITLE).as_deref(), Some("first"));
        assert_eq!(
            report.warnings,
            vec![IngestWarning::DuplicateColumn {
                column: CASE_TITLE.into(),
                ignored: "Case Title".into(),
            }]
        );
    }

    #[test]
    fn no_owner_column_means_no_owner_email() {
        let cfg = config();
        let mut table = RawTable::new(vec!["Case".into()]);
        table.push_row([CellValue::text("C-1")]);
        let out = SchemaNormalizer::new(&cfg).normalize(table, &mut IngestReport::default());
        assert!(!out.has_column(OWNER_EMAIL));
    }
}
