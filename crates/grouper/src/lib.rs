//! # Case Grouper (`grouper`)
//!
//! ## Purpose
//!
//! `grouper` sits between the ingest layer and the digest renderer. It
//! partitions validated [`CaseRecord`]s by resolved owner email, ranks each
//! partition oldest-first, and keeps the top [`TOP_N`] cases alongside the
//! full per-owner count.
//!
//! ## Core Types
//!
//! - [`OwnerDigest`]: one owner's ranked cases (`top_n`, `all_cases`) and
//!   `total_cases`.
//! - [`Grouper`]: the grouping pass, optionally restricted to one owner.
//! - [`DigestSummary`] / [`DigestCase`]: the renderer-facing projection with
//!   display-ready fields.
//!
//! ## Ranking
//!
//! ```text
//! cases ──► partition by owner_email ──► stable sort, age_days desc ──► take 3
//!                 (BTreeMap order)          (ties keep input order)
//! ```
//!
//! Sorting uses `slice::sort_by`, which is stable, so two runs over identical
//! input produce identical digests.
//!
//! ## Example Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use grouper::group_by_owner;
//! use ingest::{CaseRecord, Priority};
//!
//! let created = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
//! let cases: Vec<CaseRecord> = [10, 47, 3, 90, 5]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, age)| CaseRecord {
//!         case_id: format!("C-{i}"),
//!         case_title: "Printer offline".into(),
//!         owner_name: "jana sweid".into(),
//!         owner_email: "JSweid@example.com".into(),
//!         created_date: created,
//!         age_days: age,
//!         priority: Priority::Medium,
//!         source_row: i + 1,
//!     })
//!     .collect();
//!
//! let digests = group_by_owner(cases);
//! let jana = &digests["JSweid@example.com"];
//! let ages: Vec<i64> = jana.top_n.iter().map(|c| c.age_days).collect();
//! assert_eq!(ages, vec![90, 47, 10]);
//! assert_eq!(jana.total_cases, 5);
//! assert_eq!(jana.owner_name, "Jana Sweid");
//! ```
use std::collections::BTreeMap;

use ingest::CaseRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

mod summary;

pub use crate::summary::{DigestCase, DigestSummary, CREATED_DATE_FORMAT};

/// Cases kept per owner for the digest.
pub const TOP_N: usize = 3;

/// Digests keyed by owner email, iterated in byte order.
pub type DigestMap = BTreeMap<String, OwnerDigest>;

/// Per-owner aggregate produced by one grouping pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDigest {
    /// Title-cased name from the oldest case.
    pub owner_name: String,
    pub owner_email: String,
    /// Every valid case for this owner.
    pub total_cases: usize,
    /// At most [`TOP_N`] oldest cases, oldest first.
    pub top_n: Vec<CaseRecord>,
    /// All cases, oldest first.
    pub all_cases: Vec<CaseRecord>,
}

impl OwnerDigest {
    fn from_partition(owner_email: String, mut cases: Vec<CaseRecord>) -> Self {
        cases.sort_by(|a, b| b.age_days.cmp(&a.age_days));
        let owner_name = cases
            .first()
            .map(|case| title_case(case.owner_name.trim()))
            .unwrap_or_default();
        let top_n = cases.iter().take(TOP_N).cloned().collect();

        Self {
            owner_name,
            owner_email,
            total_cases: cases.len(),
            top_n,
            all_cases: cases,
        }
    }

    /// The renderer-facing projection of this digest.
    pub fn summary(&self) -> DigestSummary {
        DigestSummary::from(self)
    }
}

/// One grouping pass, optionally limited to a single owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouper {
    owner_filter: Option<String>,
}

impl Grouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only build the digest whose `owner_email` equals `owner_email` exactly.
    pub fn with_owner_filter(mut self, owner_email: impl Into<String>) -> Self {
        self.owner_filter = Some(owner_email.into());
        self
    }

    pub fn owner_filter(&self) -> Option<&str> {
        self.owner_filter.as_deref()
    }

    /// Partition, rank and truncate. An empty input yields an empty map.
    pub fn group(&self, cases: Vec<CaseRecord>) -> DigestMap {
        let span = tracing::span!(
            Level::INFO,
            "grouper.group",
            cases = cases.len(),
            owner_filter = ?self.owner_filter
        );
        let _guard = span.enter();

        let mut partitions: BTreeMap<String, Vec<CaseRecord>> = BTreeMap::new();
        let mut skipped = 0usize;
        for case in cases {
            if self
                .owner_filter
                .as_deref()
                .is_some_and(|owner| owner != case.owner_email)
            {
                skipped += 1;
                continue;
            }
            partitions
                .entry(case.owner_email.clone())
                .or_default()
                .push(case);
        }
        if skipped > 0 {
            debug!(skipped, "owner_filter_applied");
        }

        let digests: DigestMap = partitions
            .into_iter()
            .map(|(email, cases)| {
                let digest = OwnerDigest::from_partition(email.clone(), cases);
                (email, digest)
            })
            .collect();

        info!(owners = digests.len(), "grouping_complete");
        digests
    }
}

/// Group every case; shorthand for `Grouper::new().group(cases)`.
pub fn group_by_owner(cases: Vec<CaseRecord>) -> DigestMap {
    Grouper::new().group(cases)
}

/// Title-case a display name: the first letter of every alphabetic run is
/// upper-cased, the rest lower-cased.
///
/// ```
/// assert_eq!(grouper::title_case("jana SWEID"), "Jana Sweid");
/// assert_eq!(grouper::title_case("mary-ann o'neil"), "Mary-Ann O'Neil");
/// ```
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
