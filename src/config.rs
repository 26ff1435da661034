//! Application configuration for `casedigest`.
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. a config file: `--config <path>`, or `casedigest.{yaml,toml,json}` in
//!    the working directory when present
//! 3. environment variables prefixed `CASEDIGEST__`, with `__` between
//!    levels (`CASEDIGEST__MANAGER__EMAIL`, `CASEDIGEST__DELIVERY__GRAPH__SENDER`)
//!
//! A `.env` file is read into the environment before any of this happens.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! log_level: info
//! log_format: text
//!
//! ingest:
//!   manager_owner_name: Abdo Khoury
//!   blocked_owners: [Raji Aoun]
//!   owners:
//!     - name: Jana Sweid
//!       email: JSweid@example.com
//!   column_aliases:
//!     case_number: case_id
//!
//! manager:
//!   name: Abdo
//!   email: AKhoury@example.com
//!
//! output:
//!   drafts_dir: output/drafts
//!   send_log: output/send_log.csv
//!
//! delivery:
//!   smtp:
//!     host: smtp.office365.com
//!     port: 587
//!     username: digests@example.com
//!     password: set-me-in-the-environment
//!   # When present, Graph is used instead of SMTP.
//!   graph:
//!     tenant_id: 00000000-0000-0000-0000-000000000000
//!     client_id: 00000000-0000-0000-0000-000000000000
//!     client_secret: set-me-in-the-environment
//!     sender: digests@example.com
//! ```
//!
//! The owner directory is a list of `{name, email}` entries rather than a map
//! so that owner names keep their exact spelling through every source.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(feature = "graph")]
use delivery::{GraphChannel, GraphConfig};
use delivery::{DeliveryChannel, DeliveryError, ManagerIdentity};
#[cfg(feature = "smtp")]
use delivery::{SmtpChannel, SmtpConfig};
use ingest::{ColumnAliasMap, IngestConfig, OwnerDirectory};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File stem looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_STEM: &str = "casedigest";
/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CASEDIGEST";

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid ingest configuration: {0}")]
    Ingest(#[from] ingest::ConfigError),

    #[error("validation error: {0}")]
    Validation(String),
}

/// One owner directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerEntry {
    pub name: String,
    pub email: String,
}

/// The `ingest` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Owner display name → email.
    pub owners: Vec<OwnerEntry>,
    /// Owner whose cases never get a digest.
    pub manager_owner_name: Option<String>,
    /// Further owners excluded from every run.
    pub blocked_owners: Vec<String>,
    /// Extra header aliases, layered over the built-in CRM table.
    pub column_aliases: BTreeMap<String, String>,
}

impl IngestSettings {
    pub fn to_ingest_config(&self) -> IngestConfig {
        let extra: ColumnAliasMap = self.column_aliases.iter().collect();
        IngestConfig {
            column_aliases: ColumnAliasMap::default().merged_with(&extra),
            owner_directory: self
                .owners
                .iter()
                .map(|entry| (entry.name.trim(), entry.email.trim()))
                .collect::<OwnerDirectory>(),
            manager_owner_name: self.manager_owner_name.clone(),
            blocked_owners: self.blocked_owners.clone(),
        }
    }
}

/// The `output` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default: `output/drafts`
    pub drafts_dir: PathBuf,
    /// Default: `output/send_log.csv`
    pub send_log: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            drafts_dir: PathBuf::from("output/drafts"),
            send_log: PathBuf::from("output/send_log.csv"),
        }
    }
}

/// The `delivery` section.
///
/// Graph wins when both channels are configured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    /// Microsoft Graph app registration.
    #[cfg(feature = "graph")]
    pub graph: Option<GraphConfig>,

    /// SMTP submission server.
    #[cfg(feature = "smtp")]
    pub smtp: Option<SmtpConfig>,
}

impl DeliverySettings {
    /// Whether any channel is configured for `--send`.
    pub fn has_channel(&self) -> bool {
        #[cfg(feature = "graph")]
        if self.graph.is_some() {
            return true;
        }
        #[cfg(feature = "smtp")]
        if self.smtp.is_some() {
            return true;
        }
        false
    }

    /// Build the configured channel: Graph, else SMTP, else `None`.
    pub fn channel(&self) -> Result<Option<Box<dyn DeliveryChannel>>, DeliveryError> {
        #[cfg(feature = "graph")]
        if let Some(graph) = &self.graph {
            return Ok(Some(Box::new(GraphChannel::new(graph.clone())?)));
        }
        #[cfg(feature = "smtp")]
        if let Some(smtp) = &self.smtp {
            return Ok(Some(Box::new(SmtpChannel::new(smtp.clone())?)));
        }
        Ok(None)
    }

    fn validate(&self) -> Result<(), DeliveryError> {
        #[cfg(feature = "graph")]
        if let Some(graph) = &self.graph {
            graph.validate()?;
        }
        #[cfg(feature = "smtp")]
        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }
        Ok(())
    }
}

/// How log events are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ingest: IngestSettings,

    /// Named in every digest and copied on every delivery.
    #[serde(default)]
    pub manager: ManagerIdentity,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub delivery: DeliverySettings,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ingest: IngestSettings::default(),
            manager: ManagerIdentity::default(),
            output: OutputSettings::default(),
            delivery: DeliverySettings::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load from `.env`, the config file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`] without `.env`, reading variables from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigLoadError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_STEM).required(false),
        };
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .source(env);

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(environment);

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        self.ingest.to_ingest_config()
    }

    /// Checks that always apply, plus the live-send checks when `send` is set.
    pub fn validate(&self, send: bool) -> Result<(), ConfigLoadError> {
        self.ingest_config().validate()?;

        if self.output.drafts_dir.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "output.drafts_dir must not be empty".into(),
            ));
        }

        if send {
            if self.manager.email.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "manager.email is required with --send".into(),
                ));
            }
            if !self.delivery.has_channel() {
                return Err(ConfigLoadError::Validation(
                    "--send needs a delivery channel; configure delivery.smtp or delivery.graph"
                        .into(),
                ));
            }
            self.delivery
                .validate()
                .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        }
        Ok(())
    }
}
