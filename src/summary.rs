//! Console output: the per-owner preview and the end-of-run summary.
//!
//! Both write to any `io::Write` so tests can capture them; the binary passes
//! stdout. Logging goes to stderr through `tracing` and never mixes in here.
use std::io::{self, Write};

use crate::{DigestMap, IngestReport, RunOutcome};

const RULE_WIDTH: usize = 60;

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Banner printed before anything else.
pub fn write_banner(out: &mut impl Write, send: bool) -> io::Result<()> {
    rule(out)?;
    writeln!(out, "  CRM Case Follow-Up Digests")?;
    let mode = if send { "LIVE SEND" } else { "DRY RUN (drafts only)" };
    writeln!(out, "  Mode: {mode}")?;
    rule(out)
}

/// Row-level findings, one line each.
pub fn write_warnings(out: &mut impl Write, report: &IngestReport) -> io::Result<()> {
    for warning in &report.warnings {
        writeln!(out, "  ! {warning}")?;
    }
    writeln!(out, "  {} valid case(s) from {} row(s)", report.valid_rows, report.rows_read)
}

/// Each owner with their open-case count and oldest cases.
pub fn write_preview(out: &mut impl Write, digests: &DigestMap) -> io::Result<()> {
    writeln!(out, "\n--- Owner Summary ---")?;
    for digest in digests.values() {
        writeln!(out, "\n  {} ({})", digest.owner_name, digest.owner_email)?;
        writeln!(out, "  Total open cases: {}", digest.total_cases)?;
        writeln!(out, "  Top {} oldest:", digest.top_n.len())?;
        for (i, case) in digest.top_n.iter().enumerate() {
            writeln!(
                out,
                "    {}. [{}] {} - {}d | {}",
                i + 1,
                case.case_id,
                case.case_title,
                case.age_days,
                case.priority
            )?;
        }
    }
    writeln!(out)
}

/// Final counts, plus each failure on a live run.
pub fn write_summary(out: &mut impl Write, outcome: &RunOutcome) -> io::Result<()> {
    writeln!(out)?;
    rule(out)?;
    writeln!(out, "  SUMMARY")?;
    rule(out)?;
    writeln!(out, "  Owners processed : {}", outcome.digests.len())?;
    writeln!(out, "  Drafts saved     : {}", outcome.drafts.len())?;

    if outcome.dry_run {
        writeln!(out, "  Emails sent      : 0  (dry-run mode)")?;
        writeln!(out, "  Run with --send to deliver emails.")?;
    } else {
        let failed: Vec<_> = outcome.failed().collect();
        writeln!(out, "  Emails sent      : {}", outcome.sent())?;
        writeln!(out, "  Failures         : {}", failed.len())?;
        for report in failed {
            writeln!(out, "    x {}: {}", report.owner_email, report.status)?;
        }
        if let Some(err) = &outcome.send_log_error {
            writeln!(out, "  ! Send log not written: {err}")?;
            writeln!(out, "    The statuses above are the only record of this run.")?;
        }
    }
    rule(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use delivery::{DeliveryError, DeliveryReport, DeliveryStatus};
    use grouper::group_by_owner;
    use ingest::{CaseRecord, Priority};

    use super::*;

    fn outcome(dry_run: bool, deliveries: Vec<DeliveryReport>) -> RunOutcome {
        let Some(created) = NaiveDate::from_ymd_opt(2024, 3, 14) else {
            panic!("invalid date components");
        };
        let digests = group_by_owner(vec![CaseRecord {
            case_id: "1042".into(),
            case_title: "Printer offline".into(),
            owner_name: "Jana Sweid".into(),
            owner_email: "jana@example.com".into(),
            created_date: created,
            age_days: 47,
            priority: Priority::High,
            source_row: 1,
        }]);
        RunOutcome {
            run_id: "run".into(),
            report: IngestReport::default(),
            digests,
            drafts: Vec::new(),
            deliveries,
            send_log_error: None,
            dry_run,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("write to vec");
        String::from_utf8(buf).expect("utf-8")
    }

    #[test]
    fn preview_lists_ranked_cases() {
        let out = outcome(true, Vec::new());
        let text = render(|buf| write_preview(buf, &out.digests));
        assert!(text.contains("Jana Sweid (jana@example.com)"));
        assert!(text.contains("Total open cases: 1"));
        assert!(text.contains("1. [1042] Printer offline - 47d | High"));
    }

    #[test]
    fn dry_run_summary_reports_zero_sent() {
        let out = outcome(true, Vec::new());
        let text = render(|buf| write_summary(buf, &out));
        assert!(text.contains("Owners processed : 1"));
        assert!(text.contains("Emails sent      : 0  (dry-run mode)"));
        assert!(!text.contains("Failures"));
    }

    #[test]
    fn live_summary_lists_failures() {
        let out = outcome(
            false,
            vec![DeliveryReport {
                owner_email: "jana@example.com".into(),
                owner_name: "Jana Sweid".into(),
                subject: "s".into(),
                status: DeliveryStatus::Failed("transport error: timed out".into()),
            }],
        );
        let text = render(|buf| write_summary(buf, &out));
        assert!(text.contains("Emails sent      : 0\n"));
        assert!(text.contains("Failures         : 1"));
        assert!(text.contains("x jana@example.com: FAILED: transport error: timed out"));
        assert!(!text.contains("Send log"));
    }

    #[test]
    fn live_summary_reports_send_log_failure() {
        let mut out = outcome(
            false,
            vec![DeliveryReport {
                owner_email: "jana@example.com".into(),
                owner_name: "Jana Sweid".into(),
                subject: "s".into(),
                status: DeliveryStatus::Sent,
            }],
        );
        out.send_log_error = Some(DeliveryError::Io {
            path: "output/send_log.csv".into(),
            message: "Not a directory".into(),
        });
        let text = render(|buf| write_summary(buf, &out));
        assert!(text.contains("Emails sent      : 1"));
        assert!(text.contains("! Send log not written: i/o error on output/send_log.csv: Not a directory"));
    }
}
