mod common;

use std::fs;

use casedigest::{run, IngestError, PipelineError, RunOptions};
use common::{app_config, today, write_export};

#[test]
fn missing_created_date_column_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("cases.csv");
    fs::write(
        &input,
        "(Do Not Modify) Case,Case Title,Owner,Priority\nC-1,Printer offline,Jana Sweid,High\n",
    )
    .expect("write export");
    let cfg = app_config(dir.path());

    let result = run(&cfg, &RunOptions::dry_run(&input, today()), None);

    match result {
        Err(PipelineError::Ingest(IngestError::MissingColumns { missing, found })) => {
            assert_eq!(missing, vec!["created_date".to_string()]);
            assert!(found.contains(&"case_id".to_string()));
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
    assert!(!cfg.output.drafts_dir.exists(), "no drafts on a fatal error");
}

#[test]
fn unparseable_date_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_export(
        dir.path(),
        &[
            "C-1,Printer offline,Jana Sweid,2024-04-20,10,High",
            "C-2,VPN drops,Jana Sweid,last tuesday,,Low",
        ],
    );
    let cfg = app_config(dir.path());

    let result = run(&cfg, &RunOptions::dry_run(&input, today()), None);

    assert!(matches!(
        result,
        Err(PipelineError::Ingest(IngestError::UnparseableDate { ref value, .. })) if value == "last tuesday"
    ));
    assert!(!cfg.output.drafts_dir.exists());
}

#[test]
fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("absent.csv");
    let cfg = app_config(dir.path());

    let result = run(&cfg, &RunOptions::dry_run(&input, today()), None);

    let err = match result {
        Err(PipelineError::Ingest(err)) => err,
        other => panic!("expected an ingest error, got {other:?}"),
    };
    assert_eq!(err, IngestError::FileNotFound { path: input });
    assert!(!err.is_input_error());
}

#[test]
fn header_only_export_produces_no_drafts() -> Result<(), PipelineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_export(dir.path(), &[]);
    let cfg = app_config(dir.path());

    let outcome = run(&cfg, &RunOptions::dry_run(&input, today()), None)?;

    assert_eq!(outcome.report.rows_read, 0);
    assert!(outcome.digests.is_empty());
    assert!(outcome.drafts.is_empty());
    Ok(())
}

#[test]
fn send_without_channel_fails_before_ingest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_export(dir.path(), &["C-1,Printer offline,Jana Sweid,2024-04-20,10,High"]);
    let cfg = app_config(dir.path());
    let opts = RunOptions {
        send: true,
        ..RunOptions::dry_run(&input, today())
    };

    let result = run(&cfg, &opts, None);

    assert!(matches!(result, Err(PipelineError::Delivery(_))));
    assert!(!cfg.output.drafts_dir.exists());
    assert!(!cfg.output.send_log.exists());
}
