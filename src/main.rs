use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use track_analysis::charts::PngChartSink;
use track_analysis::config::AnalysisConfig;
use track_analysis::logging;
use track_analysis::pipeline::{ingestion, print_preview, Pipeline};

#[derive(Parser)]
#[command(name = "track_analysis")]
#[command(about = "Exploratory analysis and charts for a music track dataset")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./track_analysis.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the JSON log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset, compute every aggregate and render all charts (default)
    Run {
        /// Track dataset to analyze
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory the chart images are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Size of the most/least popular track samples
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Print the dataset's columns and first rows without rendering anything
    Preview {
        /// Track dataset to preview
        #[arg(long)]
        input: Option<PathBuf>,
        /// Number of rows to print
        #[arg(long)]
        rows: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir);

    let mut config = AnalysisConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run {
        input: None,
        output_dir: None,
        top_n: None,
    }) {
        Commands::Run {
            input,
            output_dir,
            top_n,
        } => {
            if let Some(input) = input {
                config.input_path = input;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if let Some(top_n) = top_n {
                config.track_sample = top_n;
            }
            config.validate()?;

            println!("🚀 Running track analysis...");
            let mut sink = PngChartSink::new(
                &config.output_dir,
                config.chart.width,
                config.chart.height,
            );
            match Pipeline::run(&config, &mut sink) {
                Ok(result) => {
                    info!("Pipeline finished");
                    println!("\n📊 Analysis Results:");
                    println!("   Rows loaded: {}", result.rows_loaded);
                    println!("   Genre rows: {}", result.rows_exploded);
                    println!("   Rows without a release year: {}", result.missing_years);
                    println!("   Charts written:");
                    for chart in &result.charts {
                        println!("   - {}", chart.display());
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Analysis failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Preview { input, rows } => {
            let input = input.unwrap_or_else(|| config.input_path.clone());
            let table = ingestion::load_tracks(Path::new(&input))?;
            print_preview(&table, rows.unwrap_or(config.preview_rows));
        }
    }

    Ok(())
}
