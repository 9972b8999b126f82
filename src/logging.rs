use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with console and JSON file output.
///
/// Console lines go to stderr so they never interleave with the progress
/// output on stdout. The returned guard must stay alive until exit or
/// buffered file lines are lost.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let file_writer = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "track_analysis.log");
            Some(tracing_appender::non_blocking(file_appender))
        }
        Err(e) => {
            eprintln!("⚠️  Could not create log directory {}: {}", log_dir.display(), e);
            None
        }
    };

    let (file_layer, guard) = match file_writer {
        Some((writer, guard)) => (Some(fmt::layer().json().with_writer(writer)), Some(guard)),
        None => (None, None),
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate, warnings for dependencies
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("track_analysis=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
