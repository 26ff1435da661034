//! Date parsing and case-age arithmetic.
//!
//! CRM exports carry creation dates in whatever shape the exporting locale
//! chose. We accept the forms seen in practice and nothing else; an
//! unrecognised value is a fatal input error, handled by the caller.
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::types::CellValue;

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Date-time formats, tried in order. Only the date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Excel's day zero for serial dates (the 1900 leap-year bug is baked in).
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Convert an Excel serial day number to a calendar date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    excel_epoch()?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Parse a textual date in one of the accepted forms.
///
/// ```rust
/// use chrono::NaiveDate;
/// use ingest::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 3, 14);
/// assert_eq!(parse_date("2024-03-14"), expected);
/// assert_eq!(parse_date("3/14/2024 9:05 AM"), expected);
/// assert_eq!(parse_date("14 Mar 2024"), expected);
/// assert_eq!(parse_date("next tuesday"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a `created_date` cell. Numbers are read as Excel serial dates.
pub fn parse_date_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(date) => Some(*date),
        CellValue::Text(text) => parse_date(text),
        CellValue::Number(serial) => from_excel_serial(*serial),
        CellValue::Empty => None,
    }
}

/// Whole days from `created` to `today`. Negative for future dates.
pub fn age_in_days(created: NaiveDate, today: NaiveDate) -> i64 {
    (today - created).num_days()
}

/// Numeric coercion for an explicit age cell.
///
/// Non-numeric, blank and non-finite values read as missing. Fractional ages
/// truncate toward zero.
pub fn coerce_age(cell: &CellValue) -> Option<i64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(text) => text.trim().parse::<f64>().ok()?,
        CellValue::Empty | CellValue::Date(_) => return None,
    };
    value.is_finite().then(|| value.trunc() as i64)
}
