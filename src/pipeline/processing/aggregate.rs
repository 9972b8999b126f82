use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::types::Table;

/// Mean of a value column for one group key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: String,
    pub mean: f64,
    /// Number of rows with a present value that contributed to the mean
    pub count: usize,
}

/// Occurrences of one distinct value in a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Mean of `value_column` per distinct `group_column` key, in first-encounter order.
///
/// Rows with a missing key or a missing value are skipped; a malformed value
/// is a `Parse` error.
pub fn grouped_mean(table: &Table, group_column: &str, value_column: &str) -> Result<Vec<GroupMean>> {
    let keys = table.column(group_column)?;
    let values = table.numeric_column(value_column)?;

    let mut order: Vec<(String, f64, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, value) in keys.into_iter().zip(values) {
        let (Some(key), Some(value)) = (key.group_key(), value) else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => {
                order[i].1 += value;
                order[i].2 += 1;
            }
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, value, 1));
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|(key, sum, count)| GroupMean {
            key,
            mean: sum / count as f64,
            count,
        })
        .collect())
}

/// The `n` groups with the highest mean `value_column`, sorted descending.
/// Ties keep the order in which the keys were first encountered.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn top_groups_by_mean(
    table: &Table,
    group_column: &str,
    value_column: &str,
    n: usize,
) -> Result<Vec<GroupMean>> {
    let mut groups = grouped_mean(table, group_column, value_column)?;
    debug!("{} distinct '{}' groups", groups.len(), group_column);
    groups.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    groups.truncate(n);
    Ok(groups)
}

/// Row indices with a present value in `column`, stably sorted by that value
fn ranked_rows(table: &Table, column: &str, descending: bool) -> Result<Vec<usize>> {
    let mut ranked: Vec<(usize, f64)> = table
        .numeric_column(column)?
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    if descending {
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    } else {
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    }
    Ok(ranked.into_iter().map(|(i, _)| i).collect())
}

/// The `n` rows with the largest value in `column`, largest first.
/// Ties keep original row order; rows with a missing value are never selected.
pub fn top_n(table: &Table, column: &str, n: usize) -> Result<Table> {
    let mut indices = ranked_rows(table, column, true)?;
    indices.truncate(n);
    Ok(table.select_rows(&indices))
}

/// The `n` rows with the smallest value in `column`, smallest first.
/// Ties keep original row order; rows with a missing value are never selected.
pub fn bottom_n(table: &Table, column: &str, n: usize) -> Result<Table> {
    let mut indices = ranked_rows(table, column, false)?;
    indices.truncate(n);
    Ok(table.select_rows(&indices))
}

/// Distinct values of `column` with their counts, most frequent first.
///
/// Missing cells are counted under the empty string so the counts always
/// add up to the number of rows passed in.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<ValueCount>> {
    let mut counts: Vec<ValueCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for value in table.column(column)? {
        let key = value.group_key().unwrap_or_default();
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(ValueCount { value: key, count: 1 });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

/// Arithmetic mean of the present values in `column`, `None` when there are none
pub fn column_mean(table: &Table, column: &str) -> Result<Option<f64>> {
    let present: Vec<f64> = table.numeric_column(column)?.into_iter().flatten().collect();
    if present.is_empty() {
        return Ok(None);
    }
    Ok(Some(present.iter().sum::<f64>() / present.len() as f64))
}

/// Rows whose `column` key is one of `keys`, in original order
pub fn filter_in(table: &Table, column: &str, keys: &[String]) -> Result<Table> {
    let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
    let indices: Vec<usize> = table
        .column(column)?
        .into_iter()
        .enumerate()
        .filter(|(_, v)| {
            v.group_key()
                .map(|k| wanted.contains(k.as_str()))
                .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();
    Ok(table.select_rows(&indices))
}
