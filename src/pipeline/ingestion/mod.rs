// Ingestion stage: CSV file -> in-memory Table with the required columns checked

use crate::constants::REQUIRED_COLUMNS;
use crate::error::{AnalysisError, Result};
use crate::types::{Table, Value};
use csv::{ReaderBuilder, Trim};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Load the track dataset at `path`.
///
/// A missing or unreadable file is a `DataAccess` error; a file without
/// every required column is a `Schema` error raised before any row is
/// handed to a later stage.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_tracks(path: &Path) -> Result<Table> {
    let bytes = fs::read(path).map_err(|source| AnalysisError::DataAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_tracks_from_reader(bytes.as_slice())?;

    info!("Loaded {} rows with {} columns", table.len(), table.columns().len());
    Ok(table)
}

/// Load a dataset from any reader; the schema check is the same as [`load_tracks`]
pub fn load_tracks_from_reader<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    debug!("Dataset columns: {:?}", columns);

    let mut table = Table::new(columns);
    table.require_columns(&REQUIRED_COLUMNS)?;

    let width = table.columns().len();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(AnalysisError::Shape(format!(
                "row {} has {} fields but the header has {}",
                row,
                record.len(),
                width
            )));
        }
        // Short rows are padded with Missing
        let mut cells: Vec<Value> = record.iter().map(Value::from_raw).collect();
        cells.resize(width, Value::Missing);
        table.push_row(cells)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "Track Name,Artist Name(s),Release Date,Genres,Popularity,Danceability,Valence,Energy,Tempo";

    #[test]
    fn test_load_tracks_from_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{HEADER}")?;
        writeln!(file, "Song A,Artist A,2020-01-01,\"pop, rock\",10,0.5,0.4,0.3,120")?;
        writeln!(file, "Song B,Artist B,,,5,0.6,0.5,0.4,95")?;

        let table = load_tracks(file.path())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), 9);

        let genres = table.column("Genres")?;
        assert_eq!(genres[0], &Value::Text("pop, rock".to_string()));
        assert_eq!(genres[1], &Value::Missing);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_data_access_error() {
        let err = load_tracks(Path::new("/definitely/not/here/origins.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::DataAccess { .. }));
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let csv = "Track Name,Genres,Popularity\nSong,pop,10\n";
        match load_tracks_from_reader(csv.as_bytes()) {
            Err(AnalysisError::Schema { missing }) => {
                assert!(missing.contains(&"Artist Name(s)".to_string()));
                assert!(missing.contains(&"Tempo".to_string()));
                assert!(!missing.contains(&"Genres".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_header_whitespace_is_trimmed() -> anyhow::Result<()> {
        let csv = " Artist Name(s) ,Release Date,Genres,Popularity,Danceability,Valence,Energy,Tempo\n\
                   A,2020,pop,1,0.1,0.2,0.3,100\n";
        let table = load_tracks_from_reader(csv.as_bytes())?;
        assert!(table.has_column("Artist Name(s)"));
        Ok(())
    }

    #[test]
    fn test_short_row_is_padded_with_missing() -> anyhow::Result<()> {
        let csv = format!("{HEADER}\nSong,Artist,2020,rock,20,0.5\n");
        let table = load_tracks_from_reader(csv.as_bytes())?;
        assert_eq!(table.len(), 1);

        let row = table.row(0).expect("one row");
        assert_eq!(row.len(), 9);
        assert_eq!(row[4], Value::Text("20".to_string()));
        assert_eq!(&row[6..], &[Value::Missing, Value::Missing, Value::Missing]);
        Ok(())
    }

    #[test]
    fn test_long_row_is_shape_error() {
        let csv = format!("{HEADER}\nSong,Artist,2020,pop,1,0.1,0.2,0.3,100,extra\n");
        let err = load_tracks_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AnalysisError::Shape(_)));
    }

    #[test]
    fn test_na_markers_load_as_missing() -> anyhow::Result<()> {
        let csv = format!("{HEADER}\nSong,NA,2021,N/A,N/A,0.5,0.5,0.5,100\n");
        let table = load_tracks_from_reader(csv.as_bytes())?;

        assert_eq!(table.column("Artist Name(s)")?[0], &Value::Missing);
        assert_eq!(table.column("Genres")?[0], &Value::Missing);
        assert_eq!(table.numeric_column("Popularity")?, vec![None]);
        Ok(())
    }
}
