use super::{Chart, ChartSink};
use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

/// Chart sink that keeps every chart in memory instead of drawing it.
/// Used by tests and by dry runs that only need the computed tables.
#[derive(Debug, Default)]
pub struct InMemoryChartSink {
    charts: Vec<Chart>,
}

impl InMemoryChartSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn get(&self, name: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.charts.iter().map(|c| c.name.as_str()).collect()
    }
}

impl ChartSink for InMemoryChartSink {
    fn render(&mut self, chart: &Chart) -> Result<PathBuf> {
        debug!("Recorded chart: {}", chart.name);
        self.charts.push(chart.clone());
        Ok(PathBuf::from(&chart.name))
    }
}
