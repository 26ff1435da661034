//! Configuration types for the ingest pipeline.
//!
//! This module defines [`IngestConfig`] together with the two static lookup
//! tables it carries: the [`ColumnAliasMap`] that reconciles export headers
//! with canonical column names, and the [`OwnerDirectory`] that resolves owner
//! display names to email addresses. Everything is passed in explicitly so a
//! test can swap the directory without touching process-wide state.
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::{IngestConfig, OwnerDirectory};
//!
//! let config = IngestConfig {
//!     owner_directory: OwnerDirectory::from_iter([
//!         ("Jana Sweid", "JSweid@example.com"),
//!     ]),
//!     manager_owner_name: Some("Abdo Khoury".into()),
//!     ..Default::default()
//! };
//!
//! config.validate().expect("valid configuration");
//! assert_eq!(config.owner_directory.lookup("Jana Sweid"), Some("JSweid@example.com"));
//! ```
//!
//! # Serialization
//!
//! ```json
//! {
//!   "owner_directory": { "Jana Sweid": "JSweid@example.com" },
//!   "manager_owner_name": "Abdo Khoury",
//!   "blocked_owners": ["Raji Aoun"],
//!   "column_aliases": { "case_number": "case_id" }
//! }
//! ```
//!
//! A `column_aliases` table given here replaces the defaults wholesale; use
//! [`ColumnAliasMap::merged_with`] to layer extra headers over them.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AGE_DAYS, CASE_ID, CASE_TITLE, CREATED_DATE, OWNER_NAME, PRIORITY};

/// Canonical names an alias is allowed to map onto.
pub const CANONICAL_COLUMNS: [&str; 6] = [CASE_ID, CASE_TITLE, OWNER_NAME, CREATED_DATE, AGE_DAYS, PRIORITY];

/// Header renames applied after header normalization.
///
/// Keys are normalized header names (trimmed, lower-cased, spaces replaced by
/// underscores); values are canonical column names. Keys are normalized on
/// the way in, so configuration may spell them as they appear in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ColumnAliasMap(BTreeMap<String, String>);

impl From<BTreeMap<String, String>> for ColumnAliasMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ColumnAliasMap> for BTreeMap<String, String> {
    fn from(map: ColumnAliasMap) -> Self {
        map.0
    }
}

impl ColumnAliasMap {
    /// An alias map with no entries; every header passes through unchanged.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Canonical name for `normalized_header`, or the header itself when unmapped.
    pub fn resolve<'a>(&'a self, normalized_header: &'a str) -> &'a str {
        self.0
            .get(normalized_header)
            .map(String::as_str)
            .unwrap_or(normalized_header)
    }

    /// Add or replace one alias. The key is normalized the same way headers are.
    pub fn insert(&mut self, source: &str, canonical: impl Into<String>) {
        self.0.insert(normalize_header(source), canonical.into());
    }

    /// Merge `other` over `self`; entries in `other` win.
    pub fn merged_with(mut self, other: &ColumnAliasMap) -> Self {
        for (source, canonical) in &other.0 {
            self.0.insert(source.clone(), canonical.clone());
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ColumnAliasMap {
    /// The header set produced by the CRM's case export.
    fn default() -> Self {
        let mut map = BTreeMap::new();
        for (source, canonical) in [
            ("(do_not_modify)_case", CASE_ID),
            ("owner", OWNER_NAME),
            ("created_on", CREATED_DATE),
            ("case_title", CASE_TITLE),
            ("title", CASE_TITLE),
            ("age", AGE_DAYS),
        ] {
            map.insert(source.to_string(), canonical.to_string());
        }
        Self(map)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ColumnAliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnAliasMap::empty();
        for (source, canonical) in iter {
            map.insert(source.as_ref(), canonical);
        }
        map
    }
}

/// Owner display name → email address.
///
/// Lookups are exact on the trimmed name; the directory is the only place an
/// owner email ever comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerDirectory(BTreeMap<String, String>);

impl OwnerDirectory {
    pub fn lookup(&self, owner_name: &str) -> Option<&str> {
        self.0.get(owner_name).map(String::as_str)
    }

    pub fn insert(&mut self, owner_name: impl Into<String>, email: impl Into<String>) {
        self.0.insert(owner_name.into(), email.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OwnerDirectory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, email)| (name.into(), email.into()))
                .collect(),
        )
    }
}

/// Runtime configuration for ingest behavior.
///
/// # Fields
///
/// - `column_aliases`: header renames (defaults cover the CRM export)
/// - `owner_directory`: name → email resolution table
/// - `manager_owner_name`: rows owned by the manager are excluded
/// - `blocked_owners`: further owner names whose rows are excluded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Header renames applied after header normalization.
    ///
    /// Default: [`ColumnAliasMap::default()`]
    #[serde(default)]
    pub column_aliases: ColumnAliasMap,

    /// Owner display name → email.
    ///
    /// Default: empty (every row would be dropped as unmapped)
    #[serde(default)]
    pub owner_directory: OwnerDirectory,

    /// Owner name whose cases are never part of a digest.
    ///
    /// Default: `None`
    #[serde(default)]
    pub manager_owner_name: Option<String>,

    /// Additional owner names excluded from every digest, each reported
    /// separately.
    ///
    /// Default: empty
    #[serde(default)]
    pub blocked_owners: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            column_aliases: ColumnAliasMap::default(),
            owner_directory: OwnerDirectory::default(),
            manager_owner_name: None,
            blocked_owners: Vec::new(),
        }
    }
}

/// Errors that can occur when validating an [`IngestConfig`].
///
/// These are start-up issues; surface them before reading any input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// An alias maps onto a name that is not a canonical column.
    #[error("column alias {source_column:?} maps to {target:?}, which is not a canonical column (expected one of: {})", CANONICAL_COLUMNS.join(", "))]
    UnknownAliasTarget {
        source_column: String,
        target: String,
    },

    /// A directory entry has a blank name or a blank email.
    #[error("owner directory entry {name:?} has a blank name or email")]
    BlankDirectoryEntry { name: String },

    /// A blocked owner name is blank after trimming.
    #[error("blocked_owners contains a blank name")]
    BlankBlockedOwner,
}

impl IngestConfig {
    /// Validates internal consistency of this configuration.
    ///
    /// Performs in-memory checks only; call it once at start-up.
    ///
    /// ```rust
    /// use ingest::{ColumnAliasMap, ConfigError, IngestConfig};
    ///
    /// let bad = IngestConfig {
    ///     column_aliases: ColumnAliasMap::from_iter([("Ticket", "ticket_id")]),
    ///     ..Default::default()
    /// };
    /// assert!(matches!(bad.validate(), Err(ConfigError::UnknownAliasTarget { .. })));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (source, target) in self.column_aliases.iter() {
            if !CANONICAL_COLUMNS.contains(&target) {
                return Err(ConfigError::UnknownAliasTarget {
                    source_column: source.to_string(),
                    target: target.to_string(),
                });
            }
        }

        for (name, email) in self.owner_directory.iter() {
            if name.trim().is_empty() || email.trim().is_empty() {
                return Err(ConfigError::BlankDirectoryEntry {
                    name: name.to_string(),
                });
            }
        }

        if self.blocked_owners.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::BlankBlockedOwner);
        }

        Ok(())
    }
}

/// Header normalization: trim, lower-case, spaces to underscores.
///
/// ```rust
/// assert_eq!(ingest::normalize_header("  Created On "), "created_on");
/// assert_eq!(ingest::normalize_header("(Do Not Modify) Case"), "(do_not_modify)_case");
/// ```
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(' ', "_")
}
