//! `casedigest` - CRM case follow-up digests.
//!
//! Reads a case export, ranks each owner's oldest cases and writes one HTML
//! draft per owner. With `--send` the drafts are also delivered.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use casedigest::config::{AppConfig, LogFormat};
use casedigest::{summary, RunOptions};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "casedigest", version, about = "CRM case follow-up digests")]
struct Cli {
    /// Case export to read (.csv, .xlsx, .xls, .xlsm, .ods)
    #[arg(long, default_value = "data/cases.csv")]
    input: PathBuf,

    /// Deliver the digests; without it only drafts are written
    #[arg(long)]
    send: bool,

    /// Only build and deliver the digest for this owner email
    #[arg(long, value_name = "EMAIL")]
    owner: Option<String>,

    /// Configuration file (defaults to ./casedigest.{yaml,toml,json} if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.log_level, config.log_format);
    config.validate(cli.send)?;

    let opts = RunOptions {
        input: cli.input,
        send: cli.send,
        owner: cli.owner,
        today: Local::now().date_naive(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    summary::write_banner(&mut out, opts.send)?;

    let mut channel = if opts.send {
        config
            .delivery
            .channel()
            .context("building the delivery channel")?
    } else {
        None
    };

    let prepared = casedigest::prepare(&config, &opts)?;
    summary::write_warnings(&mut out, &prepared.report)?;
    summary::write_preview(&mut out, &prepared.digests)?;
    out.flush()?;

    let outcome = match channel.as_mut() {
        Some(channel) => casedigest::execute(&config, &opts, prepared, Some(channel.as_mut()))?,
        None => casedigest::execute(&config, &opts, prepared, None)?,
    };
    summary::write_summary(&mut out, &outcome)?;
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
