// Analysis pipeline: ingestion, processing, and chart rendering

pub mod ingestion;
pub mod processing;

use crate::charts::{
    BarChart, BarOrientation, Chart, ChartKind, ChartSink, DistributionChart, PieChart,
    ScatterChart, ScatterSeries,
};
use crate::config::AnalysisConfig;
use crate::constants::*;
use crate::error::Result;
use crate::types::Table;
use metrics::{counter, histogram};
use processing::aggregate::{
    bottom_n, column_mean, filter_in, top_groups_by_mean, top_n, value_counts,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

const TOP_SAMPLE_COLOR: (u8, u8, u8) = (31, 119, 180);
const BOTTOM_SAMPLE_COLOR: (u8, u8, u8) = (214, 39, 40);

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub rows_loaded: usize,
    pub rows_exploded: usize,
    /// Rows whose release date could not be parsed
    pub missing_years: usize,
    /// Where each chart was written, in render order
    pub charts: Vec<PathBuf>,
}

pub struct Pipeline;

impl Pipeline {
    /// Load the configured dataset and run every step against it
    #[instrument(skip(config, sink), fields(input = %config.input_path.display()))]
    pub fn run(config: &AnalysisConfig, sink: &mut dyn ChartSink) -> Result<PipelineResult> {
        println!("📂 Loading dataset from {}...", config.input_path.display());
        let t_load = Instant::now();
        let table = ingestion::load_tracks(&config.input_path)?;
        histogram!("track_analysis_stage_duration_seconds", "stage" => "load")
            .record(t_load.elapsed().as_secs_f64());

        print_preview(&table, config.preview_rows);
        Self::run_on_table(&table, config, sink)
    }

    /// Run derivation, expansion, aggregation and rendering on an already loaded table
    pub fn run_on_table(
        table: &Table,
        config: &AnalysisConfig,
        sink: &mut dyn ChartSink,
    ) -> Result<PipelineResult> {
        let t_pipeline = Instant::now();
        counter!("track_analysis_runs_total").increment(1);
        counter!("track_analysis_rows_loaded_total").increment(table.len() as u64);
        table.require_columns(&REQUIRED_COLUMNS)?;

        let mut charts = Vec::new();
        let sample = config.track_sample;

        // Step 1: Derive the release year
        println!("📅 Extracting year from '{}'...", RELEASE_DATE_COLUMN);
        let t_stage = Instant::now();
        let with_year = processing::derive_year(table, RELEASE_DATE_COLUMN)?;
        let missing_years = with_year
            .column(YEAR_COLUMN)?
            .into_iter()
            .filter(|v| v.is_missing())
            .count();
        if missing_years > 0 {
            info!("{} rows have no parseable release date", missing_years);
        }
        histogram!("track_analysis_stage_duration_seconds", "stage" => "derive_year")
            .record(t_stage.elapsed().as_secs_f64());

        // Step 2: Explode genres
        println!("🏷️  Processing genres...");
        let t_stage = Instant::now();
        let data = processing::explode_genres(&with_year, GENRES_COLUMN)?;
        counter!("track_analysis_rows_exploded_total").increment(data.len() as u64);
        histogram!("track_analysis_stage_duration_seconds", "stage" => "explode")
            .record(t_stage.elapsed().as_secs_f64());

        // Step 3: Artist popularity
        println!("🎤 Calculating artist popularity...");
        let artists =
            top_groups_by_mean(&data, ARTIST_COLUMN, POPULARITY_COLUMN, config.top_artists)?;
        for (rank, artist) in artists.iter().enumerate() {
            println!("   {:>2}. {} ({:.1})", rank + 1, artist.key, artist.mean);
        }
        charts.push(render(
            sink,
            Chart::new(
                ARTIST_POPULARITY_CHART,
                ChartKind::Bar(BarChart {
                    title: format!("Top {} Artists by Average Popularity", config.top_artists),
                    x_label: "Average Popularity".to_string(),
                    y_label: "Artist".to_string(),
                    orientation: BarOrientation::Horizontal,
                    bars: artists.into_iter().map(|g| (g.key, g.mean)).collect(),
                }),
            ),
        )?);

        // Step 4: Genre distribution in the most popular tracks
        println!("🔝 Calculating genre distribution for top {sample} songs...");
        let top = top_n(&data, POPULARITY_COLUMN, sample)?;
        charts.push(render(sink, genre_pie(GENRE_TOP_CHART, "Top", sample, &top)?)?);

        // Step 5: Genre distribution in the least popular tracks
        println!("🔻 Calculating genre distribution for bottom {sample} songs...");
        let bottom = bottom_n(&data, POPULARITY_COLUMN, sample)?;
        charts.push(render(sink, genre_pie(GENRE_BOTTOM_CHART, "Bottom", sample, &bottom)?)?);

        // Step 6: Danceability comparison
        println!("💃 Comparing danceability for top {sample} vs bottom {sample} songs...");
        let mut bars = Vec::new();
        for (label, subset) in [
            (format!("Top {sample} Songs"), &top),
            (format!("Bottom {sample} Songs"), &bottom),
        ] {
            match column_mean(subset, DANCEABILITY_COLUMN)? {
                Some(mean) => bars.push((label, mean)),
                None => warn!("No danceability values for '{}'", label),
            }
        }
        charts.push(render(
            sink,
            Chart::new(
                DANCEABILITY_CHART,
                ChartKind::Bar(BarChart {
                    title: format!("Average Danceability: Top {sample} vs Bottom {sample} Songs"),
                    x_label: "Category".to_string(),
                    y_label: "Average Danceability".to_string(),
                    orientation: BarOrientation::Vertical,
                    bars,
                }),
            ),
        )?);

        // Step 7: Valence vs energy
        println!("⚡ Plotting valence vs energy for top and bottom {sample} songs...");
        charts.push(render(
            sink,
            Chart::new(
                VALENCE_ENERGY_CHART,
                ChartKind::Scatter(ScatterChart {
                    title: format!("Valence vs Energy: Top {sample} vs Bottom {sample} Songs"),
                    x_label: "Valence".to_string(),
                    y_label: "Energy".to_string(),
                    series: vec![
                        ScatterSeries {
                            label: format!("Top {sample} Songs"),
                            color: TOP_SAMPLE_COLOR,
                            points: feature_points(&top, VALENCE_COLUMN, ENERGY_COLUMN)?,
                        },
                        ScatterSeries {
                            label: format!("Bottom {sample} Songs"),
                            color: BOTTOM_SAMPLE_COLOR,
                            points: feature_points(&bottom, VALENCE_COLUMN, ENERGY_COLUMN)?,
                        },
                    ],
                }),
            ),
        )?);

        // Step 8: Tempo distribution for the most popular genres.
        // Rows tagged with any other genre are left out of this chart.
        println!("🥁 Plotting tempo distribution by genre...");
        let genres: Vec<String> =
            top_groups_by_mean(&data, GENRES_COLUMN, POPULARITY_COLUMN, config.top_genres)?
                .into_iter()
                .map(|g| g.key)
                .collect();
        let filtered = filter_in(&data, GENRES_COLUMN, &genres)?;
        info!(
            "Tempo chart keeps {} of {} genre rows",
            filtered.len(),
            data.len()
        );
        charts.push(render(
            sink,
            Chart::new(
                TEMPO_BY_GENRE_CHART,
                ChartKind::Distribution(DistributionChart {
                    title: format!("Tempo Distribution by Genre (Top {} Genres)", config.top_genres),
                    x_label: "Genre".to_string(),
                    y_label: "Tempo".to_string(),
                    groups: grouped_values(&filtered, GENRES_COLUMN, TEMPO_COLUMN)?,
                }),
            ),
        )?);

        histogram!("track_analysis_pipeline_duration_seconds")
            .record(t_pipeline.elapsed().as_secs_f64());
        println!("✅ All visualizations generated and saved!");

        Ok(PipelineResult {
            rows_loaded: table.len(),
            rows_exploded: data.len(),
            missing_years,
            charts,
        })
    }
}

fn render(sink: &mut dyn ChartSink, chart: Chart) -> Result<PathBuf> {
    let path = sink.render(&chart)?;
    counter!("track_analysis_charts_rendered_total").increment(1);
    Ok(path)
}

fn genre_pie(name: &str, which: &str, sample: usize, subset: &Table) -> Result<Chart> {
    let slices = value_counts(subset, GENRES_COLUMN)?
        .into_iter()
        .map(|vc| (vc.value, vc.count))
        .collect();
    Ok(Chart::new(
        name,
        ChartKind::Pie(PieChart {
            title: format!("Genre Distribution in {which} {sample} Songs"),
            slices,
        }),
    ))
}

/// (x, y) pairs for rows where both features are present
fn feature_points(table: &Table, x_column: &str, y_column: &str) -> Result<Vec<(f64, f64)>> {
    let xs = table.numeric_column(x_column)?;
    let ys = table.numeric_column(y_column)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect())
}

/// Present values of `value_column` per key of `group_column`, keys in first-appearance order
fn grouped_values(
    table: &Table,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<(String, Vec<f64>)>> {
    let keys = table.column(group_column)?;
    let values = table.numeric_column(value_column)?;

    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (key, value) in keys.into_iter().zip(values) {
        let Some(key) = key.group_key() else {
            continue;
        };
        let position = match groups.iter().position(|(k, _)| *k == key) {
            Some(position) => position,
            None => {
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(value) = value {
            groups[position].1.push(value);
        }
    }
    Ok(groups)
}

/// Print the column list and the first `rows` rows of the dataset
pub fn print_preview(table: &Table, rows: usize) {
    println!("Initial Dataset Preview:");
    println!("   {}", table.columns().join(" | "));
    for row in table.head(rows).rows() {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("   {}", cells.join(" | "));
    }
    println!("Dataset Columns: {:?}", table.columns());
    println!("   ({} rows total)", table.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::InMemoryChartSink;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use std::collections::HashMap;

    #[test]
    fn test_run_records_stage_counters() {
        let table = Table::from_literals(
            &REQUIRED_COLUMNS,
            &[
                &["2020", "pop, rock", "A", "80", "0.5", "0.5", "0.5", "120"],
                &["2021", "jazz", "B", "40", "0.4", "0.3", "0.2", "90"],
            ],
        )
        .unwrap();
        let config = AnalysisConfig {
            track_sample: 1,
            ..AnalysisConfig::default()
        };
        let mut sink = InMemoryChartSink::new();

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            Pipeline::run_on_table(&table, &config, &mut sink).unwrap();
        });

        let mut counters = HashMap::new();
        let mut stages = Vec::new();
        for (key, _, _, value) in snapshotter.snapshot().into_vec() {
            match value {
                DebugValue::Counter(count) => {
                    counters.insert(key.key().name().to_string(), count);
                }
                DebugValue::Histogram(_) => {
                    stages.extend(
                        key.key()
                            .labels()
                            .filter(|label| label.key() == "stage")
                            .map(|label| label.value().to_string()),
                    );
                }
                _ => {}
            }
        }

        assert_eq!(counters["track_analysis_runs_total"], 1);
        assert_eq!(counters["track_analysis_rows_loaded_total"], 2);
        assert_eq!(counters["track_analysis_rows_exploded_total"], 3);
        assert_eq!(counters["track_analysis_charts_rendered_total"], 6);
        stages.sort();
        assert_eq!(stages, vec!["derive_year", "explode"]);
    }

    #[test]
    fn test_feature_points_skip_incomplete_rows() {
        let table = Table::from_literals(
            &["v", "e"],
            &[&["0.1", "0.2"], &["", "0.5"], &["0.3", ""], &["0.4", "0.9"]],
        )
        .unwrap();
        let points = feature_points(&table, "v", "e").unwrap();
        assert_eq!(points, vec![(0.1, 0.2), (0.4, 0.9)]);
    }

    #[test]
    fn test_grouped_values_keep_first_appearance_order() {
        let table = Table::from_literals(
            &["g", "t"],
            &[&["rock", "120"], &["pop", "100"], &["rock", "130"], &["pop", ""]],
        )
        .unwrap();
        let groups = grouped_values(&table, "g", "t").unwrap();
        assert_eq!(
            groups,
            vec![
                ("rock".to_string(), vec![120.0, 130.0]),
                ("pop".to_string(), vec![100.0]),
            ]
        );
    }
}
