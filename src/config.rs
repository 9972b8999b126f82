use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_CONFIG_PATH, DEFAULT_INPUT_PATH,
    DEFAULT_PREVIEW_ROWS, DEFAULT_TOP_ARTISTS, DEFAULT_TOP_GENRES, DEFAULT_TRACK_SAMPLE,
};
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Delimited track dataset to analyze
    pub input_path: PathBuf,
    /// Directory the chart images are written to
    pub output_dir: PathBuf,
    /// Artists shown in the popularity chart
    pub top_artists: usize,
    /// Size of the most/least popular track samples
    pub track_sample: usize,
    /// Genres kept for the tempo distribution chart
    pub top_genres: usize,
    /// Rows printed in the dataset preview
    pub preview_rows: usize,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from("."),
            top_artists: DEFAULT_TOP_ARTISTS,
            track_sample: DEFAULT_TRACK_SAMPLE,
            top_genres: DEFAULT_TOP_GENRES,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            chart: ChartConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `track_analysis.toml` in the
    /// working directory is used when present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("top_artists", self.top_artists),
            ("track_sample", self.track_sample),
            ("top_genres", self.top_genres),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(AnalysisError::Config(format!("{name} must be at least 1")));
            }
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(AnalysisError::Config(
                "chart width and height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.track_sample, 50);
        assert_eq!(config.input_path, PathBuf::from("origins.csv"));
    }

    #[test]
    fn test_partial_toml_overrides_only_given_keys() {
        let config = AnalysisConfig::from_toml(
            r#"
            input_path = "data/tracks.csv"
            top_genres = 5

            [chart]
            width = 640
            "#,
        )
        .unwrap();
        assert_eq!(config.input_path, PathBuf::from("data/tracks.csv"));
        assert_eq!(config.top_genres, 5);
        assert_eq!(config.top_artists, 10);
        assert_eq!(config.chart.width, 640);
        assert_eq!(config.chart.height, 800);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = AnalysisConfig::from_toml("top_artist = 3").unwrap_err();
        assert!(matches!(err, AnalysisError::Toml(_)));
    }

    #[test]
    fn test_zero_sample_fails_validation() {
        let config = AnalysisConfig {
            track_sample: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_load_explicit_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "track_sample = 20")?;
        let config = AnalysisConfig::load(Some(file.path()))?;
        assert_eq!(config.track_sample, 20);
        Ok(())
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = AnalysisConfig::load(Some(Path::new("/no/such/track_analysis.toml"))).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
