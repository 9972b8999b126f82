use crate::constants::NA_MARKERS;
use crate::error::{AnalysisError, Result};
use std::fmt;

/// A single cell of a loaded or derived table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Empty or NA-marked source cell, or a derived field that could not be computed
    Missing,
    Text(String),
    Int(i64),
}

impl Value {
    /// Builds a cell from raw CSV text; empty text and NA markers are `Missing`
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() || NA_MARKERS.contains(&raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Key used when grouping or counting; `Missing` has no key
    pub fn group_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Text(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
        }
    }

    /// Strict numeric read. `Missing` is `None`; anything non-finite or
    /// unparseable is a `Parse` error carrying the column and row.
    pub fn to_f64(&self, column: &str, row: usize) -> Result<Option<f64>> {
        match self {
            Value::Missing => Ok(None),
            Value::Int(i) => Ok(Some(*i as f64)),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(AnalysisError::Parse {
                    column: column.to_string(),
                    row,
                    value: s.clone(),
                }),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "<missing>"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
        }
    }
}

/// In-memory table: ordered column names plus rows of equal width.
///
/// Pipeline stages never mutate a table they receive; they build a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string literals, mostly useful in tests.
    /// Cells go through [`Value::from_raw`].
    pub fn from_literals(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|raw| Value::from_raw(raw)).collect())?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AnalysisError::Shape(format!(
                "row has {} fields but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::missing_column(name))
    }

    /// Fails with a `Schema` error naming every absent column
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::Schema { missing })
        }
    }

    /// All cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Strict numeric view of a column; see [`Value::to_f64`]
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, r)| r[idx].to_f64(name, row))
            .collect()
    }

    /// Returns a copy of this table with `name` set to `values`,
    /// replacing the column if it exists and appending it otherwise.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(AnalysisError::Shape(format!(
                "column '{}' has {} values but the table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        let mut columns = self.columns.clone();
        let existing = columns.iter().position(|c| c == name);
        if existing.is_none() {
            columns.push(name.to_string());
        }

        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                match existing {
                    Some(idx) => row[idx] = value,
                    None => row.push(value),
                }
                row
            })
            .collect();

        Ok(Table { columns, rows })
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..self.rows.len().min(n)).collect();
        self.select_rows(&indices)
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Table {
        Table { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_literal_is_missing() {
        let table = Table::from_literals(&["a", "b"], &[&["x", ""]]).unwrap();
        assert_eq!(table.row(0).unwrap()[1], Value::Missing);
    }

    #[test]
    fn test_require_columns_names_every_missing_column() {
        let table = Table::new(vec!["Genres".to_string()]);
        match table.require_columns(&["Genres", "Popularity", "Tempo"]) {
            Err(AnalysisError::Schema { missing }) => {
                assert_eq!(missing, vec!["Popularity", "Tempo"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_column_is_strict() {
        let table = Table::from_literals(&["pop"], &[&["10"], &[""], &["loud"]]).unwrap();
        match table.numeric_column("pop") {
            Err(AnalysisError::Parse { column, row, value }) => {
                assert_eq!(column, "pop");
                assert_eq!(row, 2);
                assert_eq!(value, "loud");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_na_markers_are_missing() {
        for marker in ["NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "#N/A", "None"] {
            assert_eq!(Value::from_raw(marker), Value::Missing, "marker {marker:?}");
        }
        // Only exact markers count
        assert_eq!(Value::from_raw(" NA"), Value::Text(" NA".to_string()));
        assert_eq!(Value::from_raw("Nana"), Value::Text("Nana".to_string()));
    }

    #[test]
    fn test_numeric_column_treats_nan_marker_as_missing() {
        let table = Table::from_literals(&["pop"], &[&["NaN"], &["N/A"], &["7"]]).unwrap();
        assert_eq!(table.numeric_column("pop").unwrap(), vec![None, None, Some(7.0)]);
    }

    #[test]
    fn test_numeric_column_rejects_non_finite() {
        let table = Table::from_literals(&["pop"], &[&["inf"]]).unwrap();
        assert!(matches!(
            table.numeric_column("pop"),
            Err(AnalysisError::Parse { .. })
        ));
    }

    #[test]
    fn test_with_column_replaces_existing() {
        let table = Table::from_literals(&["a", "b"], &[&["1", "2"]]).unwrap();
        let replaced = table.with_column("a", vec![Value::Int(9)]).unwrap();
        assert_eq!(replaced.columns(), table.columns());
        assert_eq!(replaced.row(0).unwrap()[0], Value::Int(9));

        let appended = table.with_column("c", vec![Value::Missing]).unwrap();
        assert_eq!(appended.columns().len(), 3);
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new(vec!["a".to_string()]);
        assert!(table.push_row(vec![Value::Missing, Value::Missing]).is_err());
    }
}
