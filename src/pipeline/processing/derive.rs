use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument};

use crate::constants::YEAR_COLUMN;
use crate::error::Result;
use crate::types::{Table, Value};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Tolerant year parse for a release-date string.
///
/// Release dates come at day, month or year precision depending on the
/// label metadata, so all three are accepted. Returns `None` for anything
/// that is not a recognizable date.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date.year());
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.year());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }

    // Month precision: "1982-05"
    if s.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Some(date.year());
        }
    }

    // Year precision: "1982"
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s
            .parse::<i32>()
            .ok()
            .filter(|y| NaiveDate::from_ymd_opt(*y, 1, 1).is_some());
    }

    None
}

/// Year for a single cell. Text goes through [`parse_year`]; an `Int` is
/// already a year, which keeps derivation idempotent.
pub fn year_of(value: &Value) -> Value {
    match value {
        Value::Missing => Value::Missing,
        Value::Int(year) => Value::Int(*year),
        Value::Text(s) => parse_year(s)
            .map(|y| Value::Int(i64::from(y)))
            .unwrap_or(Value::Missing),
    }
}

/// Returns a copy of `table` with a `year` column derived from `source_column`.
///
/// Row `i` of the output corresponds to row `i` of the input. Unparseable
/// dates become `Missing`; they never fail the run.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn derive_year(table: &Table, source_column: &str) -> Result<Table> {
    let years: Vec<Value> = table
        .column(source_column)?
        .into_iter()
        .map(year_of)
        .collect();

    let missing = years.iter().filter(|v| v.is_missing()).count();
    if missing > 0 {
        debug!("{} of {} rows have no parseable release date", missing, years.len());
    }
    info!("Derived '{}' from '{}'", YEAR_COLUMN, source_column);

    table.with_column(YEAR_COLUMN, years)
}
