//! Workspace umbrella crate for `casedigest`.
//!
//! This crate stitches the stage crates together so the binary, the
//! integration tests and the benches drive one pipeline:
//!
//! ```text
//! input file ──► ingest ──► grouper ──► delivery (render + save) ──► delivery (send + log)
//!               IngestReport  DigestMap     Vec<Draft>                Vec<DeliveryReport>
//! ```
//!
//! Fatal problems (unreadable input, missing columns, bad dates) surface as a
//! [`PipelineError`] before any draft is written. Per-owner delivery failures
//! never do; they are reported in [`RunOutcome::deliveries`]. Neither does a
//! send log that cannot be written after mail has gone out
//! ([`RunOutcome::send_log_error`]).
//!
//! The binary calls [`prepare`] and [`execute`] separately so it can show the
//! preview before anything is written or sent; [`run`] does both.

pub mod config;
pub mod summary;

pub use delivery::{
    DeliveryChannel, DeliveryError, DeliveryReport, DeliveryStatus, DigestRenderer, Draft,
    DraftStore, ManagerIdentity, SendLog,
};
pub use grouper::{DigestMap, DigestSummary, Grouper, OwnerDigest, TOP_N};
pub use ingest::{CaseRecord, IngestConfig, IngestError, IngestReport, IngestWarning};

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;

/// Errors that abort a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),

    #[error("delivery failure: {0}")]
    Delivery(#[from] DeliveryError),
}

/// What to do on this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Send through the channel; otherwise drafts only.
    pub send: bool,
    /// Restrict every stage to this owner email.
    pub owner: Option<String>,
    /// Reference date for ages and the subject line.
    pub today: NaiveDate,
}

impl RunOptions {
    pub fn dry_run(input: impl Into<PathBuf>, today: NaiveDate) -> Self {
        Self {
            input: input.into(),
            send: false,
            owner: None,
            today,
        }
    }
}

/// Ingested and grouped input for one run. Nothing has been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Identifies this run in logs and the send log.
    pub run_id: String,
    pub report: IngestReport,
    pub digests: DigestMap,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: String,
    pub report: IngestReport,
    pub digests: DigestMap,
    /// Saved drafts, in owner-email order.
    pub drafts: Vec<Draft>,
    /// Empty on a dry run.
    pub deliveries: Vec<DeliveryReport>,
    /// Set when the deliveries went out but could not be logged.
    pub send_log_error: Option<DeliveryError>,
    pub dry_run: bool,
}

impl RunOutcome {
    pub fn sent(&self) -> usize {
        self.deliveries.iter().filter(|r| r.status.is_sent()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeliveryReport> {
        self.deliveries.iter().filter(|r| !r.status.is_sent())
    }
}

/// Read, validate and group one export.
pub fn build_digests(
    input: &Path,
    cfg: &IngestConfig,
    today: NaiveDate,
    owner: Option<&str>,
) -> Result<(IngestReport, DigestMap), PipelineError> {
    let outcome = ingest::ingest_file(input, cfg, today)?;
    let grouper = match owner {
        Some(owner) => Grouper::new().with_owner_filter(owner),
        None => Grouper::new(),
    };
    let digests = grouper.group(outcome.cases);
    Ok((outcome.report, digests))
}

/// Render every digest and save it under `store`.
pub fn build_drafts(
    digests: &DigestMap,
    renderer: &DigestRenderer,
    store: &mut DraftStore,
) -> Result<Vec<Draft>, PipelineError> {
    digests
        .values()
        .map(|digest| {
            let mut draft = renderer.render(&digest.summary())?;
            store.save(&mut draft)?;
            Ok(draft)
        })
        .collect()
}

/// First half of a run: ingest and group. Fatal input problems stop here,
/// before any draft exists.
pub fn prepare(cfg: &AppConfig, opts: &RunOptions) -> Result<Prepared, PipelineError> {
    let run_id = Uuid::new_v4().to_string();
    let span = run_span(&run_id, opts);
    let _guard = span.enter();

    let (report, digests) = build_digests(
        &opts.input,
        &cfg.ingest_config(),
        opts.today,
        opts.owner.as_deref(),
    )?;
    info!(owners = digests.len(), valid_rows = report.valid_rows, "run_prepared");
    Ok(Prepared {
        run_id,
        report,
        digests,
    })
}

/// Second half of a run: save drafts, then deliver and log them when
/// `opts.send` is set.
///
/// Once anything has been sent this returns `Ok`. A send-log write failure
/// is kept in [`RunOutcome::send_log_error`] so the delivery statuses still
/// reach the caller.
pub fn execute(
    cfg: &AppConfig,
    opts: &RunOptions,
    prepared: Prepared,
    channel: Option<&mut dyn DeliveryChannel>,
) -> Result<RunOutcome, PipelineError> {
    let span = run_span(&prepared.run_id, opts);
    let _guard = span.enter();

    let channel = require_channel(opts, channel)?;
    let Prepared {
        run_id,
        report,
        digests,
    } = prepared;

    let renderer = DigestRenderer::new(cfg.manager.clone(), opts.today)?;
    let mut store = DraftStore::new(&cfg.output.drafts_dir);
    let drafts = build_drafts(&digests, &renderer, &mut store)?;

    let (deliveries, send_log_error) = match channel {
        Some(channel) => {
            let deliveries = delivery::dispatch(&drafts, channel, &cfg.manager);
            let logged = SendLog::new(&cfg.output.send_log).append(&run_id, &deliveries);
            (deliveries, logged.err())
        }
        None => (Vec::new(), None),
    };
    if let Some(err) = &send_log_error {
        warn!(error = %err, path = %cfg.output.send_log.display(), "send_log_failed");
    }

    Ok(RunOutcome {
        run_id,
        report,
        digests,
        drafts,
        deliveries,
        send_log_error,
        dry_run: !opts.send,
    })
}

/// Run the whole pipeline: [`prepare`] then [`execute`].
///
/// `channel` is only consulted when `opts.send` is set. A live run without
/// one fails before the input is read.
pub fn run(
    cfg: &AppConfig,
    opts: &RunOptions,
    channel: Option<&mut dyn DeliveryChannel>,
) -> Result<RunOutcome, PipelineError> {
    let start = Instant::now();
    let result = require_channel(opts, channel).and_then(|channel| {
        let prepared = prepare(cfg, opts)?;
        execute(cfg, opts, prepared, channel)
    });

    let elapsed_micros = start.elapsed().as_micros();
    match &result {
        Ok(outcome) => info!(
            run_id = %outcome.run_id,
            owners = outcome.digests.len(),
            drafts = outcome.drafts.len(),
            sent = outcome.sent(),
            elapsed_micros,
            "run_complete"
        ),
        Err(err) => warn!(error = %err, elapsed_micros, "run_failed"),
    }
    result
}

fn run_span(run_id: &str, opts: &RunOptions) -> tracing::Span {
    tracing::span!(
        tracing::Level::INFO,
        "casedigest.run",
        run_id = %run_id,
        input = %opts.input.display(),
        send = opts.send,
        owner = ?opts.owner
    )
}

fn require_channel<'a>(
    opts: &RunOptions,
    channel: Option<&'a mut dyn DeliveryChannel>,
) -> Result<Option<&'a mut dyn DeliveryChannel>, PipelineError> {
    match (opts.send, channel) {
        (true, None) => {
            let err = DeliveryError::Config("live send requested without a delivery channel".into());
            Err(err.into())
        }
        (true, Some(channel)) => Ok(Some(channel)),
        (false, _) => Ok(None),
    }
}
