//! Renderer-facing projection of an [`OwnerDigest`].
//!
//! Everything here is display-ready: dates are pre-formatted and priorities
//! are plain strings, so a template never has to know about chrono or enums.
use ingest::CaseRecord;
use serde::{Deserialize, Serialize};

use crate::OwnerDigest;

/// `created_date` display format, e.g. `14 Mar 2024`.
pub const CREATED_DATE_FORMAT: &str = "%d %b %Y";

/// One ranked case as shown in a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestCase {
    pub case_id: String,
    pub case_title: String,
    pub age_days: i64,
    pub priority: String,
    pub created_date: String,
}

impl From<&CaseRecord> for DigestCase {
    fn from(case: &CaseRecord) -> Self {
        Self {
            case_id: case.case_id.clone(),
            case_title: case.case_title.clone(),
            age_days: case.age_days,
            priority: case.priority.to_string(),
            created_date: case.created_date.format(CREATED_DATE_FORMAT).to_string(),
        }
    }
}

/// What the renderer receives for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSummary {
    pub owner_name: String,
    pub owner_email: String,
    pub total_cases: usize,
    pub top_n: Vec<DigestCase>,
}

impl From<&OwnerDigest> for DigestSummary {
    fn from(digest: &OwnerDigest) -> Self {
        Self {
            owner_name: digest.owner_name.clone(),
            owner_email: digest.owner_email.clone(),
            total_cases: digest.total_cases,
            top_n: digest.top_n.iter().map(DigestCase::from).collect(),
        }
    }
}
