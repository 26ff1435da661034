mod common;

use casedigest::{build_digests, PipelineError};
use common::{app_config, today, write_export};

#[test]
fn same_export_yields_identical_digests() -> Result<(), PipelineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_export(
        dir.path(),
        &[
            "C-1,Printer offline,Jana Sweid,2024-04-20,10,High",
            "C-2,VPN drops,Jana Sweid,2024-04-20,10,Low",
            "C-3,Password reset,Jana Sweid,2024-04-20,10,Medium",
            "C-4,Laptop order,Jana Sweid,2024-04-20,10,High",
            "C-5,Desk phone,Georges Haddad,2024-04-01,29,Medium",
        ],
    );
    let cfg = app_config(dir.path()).ingest_config();

    let (first_report, first) = build_digests(&input, &cfg, today(), None)?;
    let (second_report, second) = build_digests(&input, &cfg, today(), None)?;

    assert_eq!(first_report, second_report);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn age_ties_keep_file_order() -> Result<(), PipelineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_export(
        dir.path(),
        &[
            "C-1,First,Jana Sweid,2024-04-20,10,High",
            "C-2,Second,Jana Sweid,2024-04-20,10,Low",
            "C-3,Third,Jana Sweid,2024-04-20,10,Medium",
            "C-4,Fourth,Jana Sweid,2024-04-20,10,High",
        ],
    );
    let cfg = app_config(dir.path()).ingest_config();

    let (_, digests) = build_digests(&input, &cfg, today(), None)?;

    let ids: Vec<&str> = digests["JSweid@example.com"]
        .top_n
        .iter()
        .map(|case| case.case_id.as_str())
        .collect();
    assert_eq!(ids, vec!["C-1", "C-2", "C-3"]);
    Ok(())
}
