use tracing::{info, instrument};

use crate::constants::GENRE_SEPARATOR;
use crate::error::Result;
use crate::types::{Table, Value};

/// Canonical form of a genre tag: surrounding whitespace trimmed, lower-cased
pub fn normalize_genre(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Split a raw genre cell into normalized tags.
///
/// Always yields at least one tag: an empty or missing cell becomes a
/// single empty tag so the track still reaches every aggregation.
pub fn split_genres(value: &Value) -> Vec<String> {
    match value.group_key() {
        None => vec![String::new()],
        Some(raw) => raw.split(GENRE_SEPARATOR).map(normalize_genre).collect(),
    }
}

/// Explode `column` so each output row carries exactly one genre tag.
///
/// Every input row yields k >= 1 output rows, in input order, each a copy
/// of the original row with the genre cell replaced by one normalized tag.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn explode_genres(table: &Table, column: &str) -> Result<Table> {
    let idx = table.column_index(column)?;

    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        for tag in split_genres(&row[idx]) {
            let mut exploded = row.to_vec();
            exploded[idx] = Value::Text(tag);
            rows.push(exploded);
        }
    }

    info!("Exploded {} rows into {} genre rows", table.len(), rows.len());
    Ok(Table::from_parts(table.columns().to_vec(), rows))
}
