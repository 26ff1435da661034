use chrono::NaiveDate;
use ingest::{ingest_table, read_delimited, IngestConfig, OwnerDirectory};

const EXPORT: &str = "\
(Do Not Modify) Case,Case Title,Owner,Created On,Priority
1042,Printer offline,Jana Sweid,2024-03-14,high
1043,VPN drops at night,Fadi Hanna,3/1/2024,urgent
1044,Quarterly access review,Abdo Khoury,2024-02-01,Low
1045,Mailbox quota,Sam Doe,2024-04-02,Normal
";

fn fixed_today() -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(2024, 4, 30) else {
        panic!("invalid date components");
    };
    date
}

fn main() {
    let config = IngestConfig {
        owner_directory: OwnerDirectory::from_iter([
            ("Jana Sweid", "JSweid@example.com"),
            ("Fadi Hanna", "FHanna@example.com"),
        ]),
        manager_owner_name: Some("Abdo Khoury".into()),
        ..Default::default()
    };

    let table = match read_delimited(EXPORT.as_bytes()) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("read failed: {err}");
            return;
        }
    };

    match ingest_table(table, &config, fixed_today()) {
        Ok(outcome) => {
            for warning in &outcome.report.warnings {
                println!("warning: {warning}");
            }
            for case in &outcome.cases {
                println!("{case:#?}");
            }
        }
        Err(err) => eprintln!("ingest failed: {err}"),
    }
}
