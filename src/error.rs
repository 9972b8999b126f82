use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot read data file '{}': {source}", path.display())]
    DataAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Column '{column}', row {row}: cannot parse '{value}' as a number")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Table shape mismatch: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to render chart '{chart}': {message}")]
    Chart { chart: String, message: String },
}

impl AnalysisError {
    pub fn missing_column(name: &str) -> Self {
        AnalysisError::Schema {
            missing: vec![name.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
