#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use casedigest::config::{AppConfig, IngestSettings, OutputSettings, OwnerEntry};
use casedigest::ManagerIdentity;
use chrono::NaiveDate;

pub const HEADER: &str = "(Do Not Modify) Case,Case Title,Owner,Created On,Age,Priority";

pub fn today() -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(2024, 4, 30) else {
        panic!("invalid date components");
    };
    date
}

/// Writes `rows` under the CRM header and returns the file path.
pub fn write_export(dir: &Path, rows: &[&str]) -> PathBuf {
    let mut body = String::from(HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    let path = dir.join("cases.csv");
    fs::write(&path, body).expect("write export");
    path
}

/// Three mapped owners plus an excluded manager, writing under `dir`.
pub fn app_config(dir: &Path) -> AppConfig {
    AppConfig {
        ingest: IngestSettings {
            owners: vec![
                owner("Jana Sweid", "JSweid@example.com"),
                owner("Georges Haddad", "GHaddad@example.com"),
                owner("Abdo Khoury", "AKhoury@example.com"),
            ],
            manager_owner_name: Some("Abdo Khoury".into()),
            blocked_owners: vec!["Raji Aoun".into()],
            ..Default::default()
        },
        manager: ManagerIdentity::new("Abdo", "AKhoury@example.com"),
        output: OutputSettings {
            drafts_dir: dir.join("drafts"),
            send_log: dir.join("send_log.csv"),
        },
        ..Default::default()
    }
}

fn owner(name: &str, email: &str) -> OwnerEntry {
    OwnerEntry {
        name: name.into(),
        email: email.into(),
    }
}
