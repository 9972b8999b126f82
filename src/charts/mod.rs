// Chart sink: consumes already-computed aggregates and renders them

pub mod in_memory;
pub mod png;

pub use in_memory::InMemoryChartSink;
pub use png::PngChartSink;

use crate::error::Result;
use std::path::PathBuf;

/// RGB color carried by chart descriptions so sinks stay backend-agnostic
pub type Rgb = (u8, u8, u8);

/// Orientation of a bar chart's bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarOrientation {
    /// Categories on the y axis, values along x
    Horizontal,
    /// Categories on the x axis, values along y
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub orientation: BarOrientation,
    /// (category, value) in display order, first bar first
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    /// (category, count) in display order
    pub slices: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub label: String,
    pub color: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
}

/// One distribution (violin) per category
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub groups: Vec<(String, Vec<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Bar(BarChart),
    Pie(PieChart),
    Scatter(ScatterChart),
    Distribution(DistributionChart),
}

/// A chart ready to render, identified by the file stem it is written under
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub name: String,
    pub kind: ChartKind,
}

impl Chart {
    pub fn new(name: &str, kind: ChartKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Destination for rendered charts.
///
/// Each call is an independent terminal side effect: a chart written before
/// a later failure stays written.
pub trait ChartSink {
    /// Render `chart`, returning where it was written
    fn render(&mut self, chart: &Chart) -> Result<PathBuf>;
}
