//! Append-only CSV record of delivery attempts.
//!
//! Columns: `run_id,owner_email,subject,status`. The header is written only
//! when the file is created; later runs append below it.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatch::DeliveryReport;
use crate::error::DeliveryError;

/// One line of the send log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendLogEntry {
    pub run_id: String,
    pub owner_email: String,
    pub subject: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendLog {
    path: PathBuf,
}

impl SendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per report. Returns the number of lines written.
    pub fn append(&self, run_id: &str, reports: &[DeliveryReport]) -> Result<usize, DeliveryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| DeliveryError::io(parent, err))?;
        }

        let is_new = fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| DeliveryError::io(&self.path, err))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for report in reports {
            writer
                .serialize(SendLogEntry {
                    run_id: run_id.to_string(),
                    owner_email: report.owner_email.clone(),
                    subject: report.subject.clone(),
                    status: report.status.to_string(),
                })
                .map_err(|err| DeliveryError::io(&self.path, err))?;
        }
        writer.flush().map_err(|err| DeliveryError::io(&self.path, err))?;

        info!(path = %self.path.display(), entries = reports.len(), "send_log_appended");
        Ok(reports.len())
    }

    /// Every entry written so far, oldest first. A missing file reads as empty.
    pub fn entries(&self) -> Result<Vec<SendLogEntry>, DeliveryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|err| DeliveryError::io(&self.path, err))?;
        reader
            .deserialize()
            .collect::<Result<Vec<SendLogEntry>, _>>()
            .map_err(|err| DeliveryError::io(&self.path, err))
    }
}
