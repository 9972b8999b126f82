pub mod charts;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use error::{AnalysisError, Result};
pub use pipeline::{Pipeline, PipelineResult};
pub use types::{Table, Value};
