//! PNG rendering of chart descriptions using the [`plotters`] bitmap backend.
//!
//! Everything is drawn with primitive elements (rectangles, polygons, circles)
//! so the same code works headless in CI and containers.

use super::{
    BarChart, BarOrientation, Chart, ChartKind, ChartSink, DistributionChart, PieChart, Rgb,
    ScatterChart,
};
use crate::error::{AnalysisError, Result};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::TextStyle;
use std::f64::consts::PI;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

type DrawResult = std::result::Result<(), String>;

// seaborn "pastel"
const PASTEL: [Rgb; 10] = [
    (161, 201, 244),
    (255, 180, 130),
    (141, 229, 161),
    (255, 159, 155),
    (208, 187, 255),
    (222, 187, 155),
    (250, 176, 228),
    (207, 207, 207),
    (255, 254, 163),
    (185, 242, 240),
];

// colorbrewer "Set3"
const SET3: [Rgb; 4] = [(141, 211, 199), (255, 255, 179), (190, 186, 218), (251, 128, 114)];

// "coolwarm" sampled at ten stops
const COOLWARM: [Rgb; 10] = [
    (59, 76, 192),
    (88, 118, 226),
    (122, 156, 251),
    (157, 188, 255),
    (192, 212, 245),
    (221, 220, 219),
    (242, 203, 183),
    (247, 172, 142),
    (238, 132, 104),
    (180, 4, 38),
];

const BLUES_DARK: Rgb = (8, 48, 107);
const BLUES_LIGHT: Rgb = (198, 219, 239);

/// Number of points sampled along each violin's density curve
const KDE_POINTS: usize = 100;

/// Writes each chart as `<output_dir>/<name>.png`, overwriting existing files
pub struct PngChartSink {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl PngChartSink {
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            width,
            height,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.png"))
    }
}

impl ChartSink for PngChartSink {
    #[instrument(skip(self, chart), fields(chart = %chart.name))]
    fn render(&mut self, chart: &Chart) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(&chart.name);
        let size = (self.width, self.height);

        let drawn = match &chart.kind {
            ChartKind::Bar(bar) => draw_bar(&path, size, bar),
            // Pies are drawn on a square canvas so they stay round
            ChartKind::Pie(pie) => {
                let side = self.width.min(self.height);
                draw_pie(&path, (side, side), pie)
            }
            ChartKind::Scatter(scatter) => draw_scatter(&path, size, scatter),
            ChartKind::Distribution(dist) => draw_distribution(&path, size, dist),
        };

        drawn.map_err(|message| AnalysisError::Chart {
            chart: chart.name.clone(),
            message,
        })?;

        info!("Saved chart to {}", path.display());
        Ok(path)
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Linear blend from the dark end of the Blues ramp to the light end
fn blues(index: usize, count: usize) -> RGBColor {
    let t = if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.0
    };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        lerp(BLUES_DARK.0, BLUES_LIGHT.0),
        lerp(BLUES_DARK.1, BLUES_LIGHT.1),
        lerp(BLUES_DARK.2, BLUES_LIGHT.2),
    )
}

fn centered(size: f64) -> TextStyle<'static> {
    TextStyle::from(("sans-serif", size)).pos(Pos::new(HPos::Center, VPos::Center))
}

fn display_label(label: &str) -> &str {
    if label.is_empty() {
        "(untagged)"
    } else {
        label
    }
}

/// Upper bound for a value axis starting at zero
fn value_axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 && max.is_finite() {
        max * 1.1
    } else {
        1.0
    }
}

/// Data range with a 5% pad on both sides; degenerate ranges are widened
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|l| display_label(l).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Label for a numeric axis whose integer positions are categories
fn category_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels
        .get(rounded as usize)
        .map(|l| display_label(l).to_string())
        .unwrap_or_default()
}

fn draw_empty(path: &Path, size: (u32, u32), title: &str) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;
    let root = root
        .titled(title, ("sans-serif", 32))
        .map_err(|e| e.to_string())?;
    let (w, h) = root.dim_in_pixel();
    root.draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), centered(28.0)))
        .map_err(|e| e.to_string())?;
    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

fn draw_bar(path: &Path, size: (u32, u32), bar: &BarChart) -> DrawResult {
    if bar.bars.is_empty() {
        return draw_empty(path, size, &bar.title);
    }

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let n = bar.bars.len() as i32;
    let value_max = value_axis_max(bar.bars.iter().map(|(_, v)| *v));

    match bar.orientation {
        BarOrientation::Horizontal => {
            // Segment 0 sits at the bottom; reverse so the first bar is on top
            let ordered: Vec<&(String, f64)> = bar.bars.iter().rev().collect();
            let labels: Vec<String> = ordered.iter().map(|(l, _)| l.clone()).collect();
            let label_of = |v: &SegmentValue<i32>| segment_label(&labels, v);

            let mut chart = ChartBuilder::on(&root)
                .caption(&bar.title, ("sans-serif", 32))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(260)
                .build_cartesian_2d(0f64..value_max, (0..n).into_segmented())
                .map_err(|e| e.to_string())?;

            chart
                .configure_mesh()
                .disable_y_mesh()
                .x_desc(bar.x_label.as_str())
                .y_desc(bar.y_label.as_str())
                .y_label_formatter(&label_of)
                .label_style(("sans-serif", 18))
                .draw()
                .map_err(|e| e.to_string())?;

            let count = ordered.len();
            chart
                .draw_series(ordered.iter().enumerate().map(|(i, (_, value))| {
                    let segment = i as i32;
                    // Darkest shade on the top bar
                    let color = blues(count - 1 - i, count);
                    let mut rect = Rectangle::new(
                        [
                            (0.0, SegmentValue::Exact(segment)),
                            (*value, SegmentValue::Exact(segment + 1)),
                        ],
                        color.filled(),
                    );
                    rect.set_margin(6, 6, 0, 0);
                    rect
                }))
                .map_err(|e| e.to_string())?;
        }
        BarOrientation::Vertical => {
            let labels: Vec<String> = bar.bars.iter().map(|(l, _)| l.clone()).collect();
            let label_of = |v: &SegmentValue<i32>| segment_label(&labels, v);

            let mut chart = ChartBuilder::on(&root)
                .caption(&bar.title, ("sans-serif", 32))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(80)
                .build_cartesian_2d((0..n).into_segmented(), 0f64..value_max)
                .map_err(|e| e.to_string())?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(bar.x_label.as_str())
                .y_desc(bar.y_label.as_str())
                .x_label_formatter(&label_of)
                .label_style(("sans-serif", 18))
                .draw()
                .map_err(|e| e.to_string())?;

            chart
                .draw_series(bar.bars.iter().enumerate().map(|(i, (_, value))| {
                    let segment = i as i32;
                    let color = rgb(SET3[i % SET3.len()]);
                    let mut rect = Rectangle::new(
                        [
                            (SegmentValue::Exact(segment), 0.0),
                            (SegmentValue::Exact(segment + 1), *value),
                        ],
                        color.filled(),
                    );
                    rect.set_margin(0, 0, 40, 40);
                    rect
                }))
                .map_err(|e| e.to_string())?;
        }
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

/// Start and end angle (radians) of each slice, counter-clockwise from 3 o'clock
pub(crate) fn slice_angles(counts: &[usize]) -> Vec<(f64, f64)> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut start = 0.0;
    counts
        .iter()
        .map(|&count| {
            let end = start + 2.0 * PI * count as f64 / total as f64;
            let slice = (start, end);
            start = end;
            slice
        })
        .collect()
}

/// Closed outline of a unit-circle wedge between two angles
fn wedge(start: f64, end: f64) -> Vec<(f64, f64)> {
    let steps = (((end - start) / (2.0 * PI)) * 180.0).ceil().max(2.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push((0.0, 0.0));
    for step in 0..=steps {
        let angle = start + (end - start) * step as f64 / steps as f64;
        points.push((angle.cos(), angle.sin()));
    }
    points
}

fn draw_pie(path: &Path, size: (u32, u32), pie: &PieChart) -> DrawResult {
    let counts: Vec<usize> = pie.slices.iter().map(|(_, c)| *c).collect();
    let angles = slice_angles(&counts);
    if angles.is_empty() {
        return draw_empty(path, size, &pie.title);
    }
    let total: usize = counts.iter().sum();

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;
    let root = root
        .titled(&pie.title, ("sans-serif", 32))
        .map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(-1.4f64..1.4f64, -1.4f64..1.4f64)
        .map_err(|e| e.to_string())?;

    for (i, ((label, count), (start, end))) in pie.slices.iter().zip(angles).enumerate() {
        let color = rgb(PASTEL[i % PASTEL.len()]);
        chart
            .draw_series(iter::once(Polygon::new(wedge(start, end), color.filled())))
            .map_err(|e| e.to_string())?;

        let mid = (start + end) / 2.0;
        let share = *count as f64 / total as f64 * 100.0;
        chart
            .draw_series(iter::once(Text::new(
                format!("{share:.1}%"),
                (0.6 * mid.cos(), 0.6 * mid.sin()),
                centered(16.0),
            )))
            .map_err(|e| e.to_string())?;
        chart
            .draw_series(iter::once(Text::new(
                display_label(label).to_string(),
                (1.18 * mid.cos(), 1.18 * mid.sin()),
                centered(16.0),
            )))
            .map_err(|e| e.to_string())?;
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

fn draw_scatter(path: &Path, size: (u32, u32), scatter: &ScatterChart) -> DrawResult {
    let all_points: Vec<(f64, f64)> = scatter
        .series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .collect();
    if all_points.is_empty() {
        return draw_empty(path, size, &scatter.title);
    }

    let (x_min, x_max) = padded_range(all_points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(all_points.iter().map(|p| p.1));

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&scatter.title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc(scatter.x_label.as_str())
        .y_desc(scatter.y_label.as_str())
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| e.to_string())?;

    for series in &scatter.series {
        let color = rgb(series.color);
        chart
            .draw_series(
                series
                    .points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 5, color.mix(0.7).filled())),
            )
            .map_err(|e| e.to_string())?
            .label(series.label.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

/// Gaussian KDE bandwidth using Scott's rule.
/// Falls back to 1.0 when the sample has no spread.
pub(crate) fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 1.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let bandwidth = variance.sqrt() * n.powf(-0.2);
    if bandwidth > 0.0 && bandwidth.is_finite() {
        bandwidth
    } else {
        1.0
    }
}

/// Density estimate sampled at `points` evenly spaced positions, extending two
/// bandwidths past the data on each side. Returns (position, density) pairs.
pub(crate) fn kde_profile(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    if values.is_empty() || points < 2 {
        return Vec::new();
    }
    let bandwidth = scott_bandwidth(values);
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let lo = min - 2.0 * bandwidth;
    let hi = max + 2.0 * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * PI).sqrt());

    (0..points)
        .map(|i| {
            let at = lo + step * i as f64;
            let density = values
                .iter()
                .map(|v| {
                    let z = (at - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (at, density)
        })
        .collect()
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mirrored outline around `center`, half-width scaled so the peak spans `half_width`
fn violin_outline(center: f64, profile: &[(f64, f64)], half_width: f64) -> Vec<(f64, f64)> {
    let peak = profile.iter().map(|p| p.1).fold(0.0, f64::max);
    if peak <= 0.0 {
        return Vec::new();
    }
    let scale = half_width / peak;
    let right = profile.iter().map(|&(y, d)| (center + d * scale, y));
    let left = profile.iter().rev().map(|&(y, d)| (center - d * scale, y));
    right.chain(left).collect()
}

fn draw_distribution(path: &Path, size: (u32, u32), dist: &DistributionChart) -> DrawResult {
    let groups: Vec<&(String, Vec<f64>)> =
        dist.groups.iter().filter(|(_, v)| !v.is_empty()).collect();
    if groups.is_empty() {
        return draw_empty(path, size, &dist.title);
    }

    let profiles: Vec<Vec<(f64, f64)>> = groups
        .iter()
        .map(|(_, values)| kde_profile(values, KDE_POINTS))
        .collect();
    let (y_min, y_max) = padded_range(profiles.iter().flatten().map(|p| p.0));

    let k = groups.len();
    let labels: Vec<String> = groups.iter().map(|(l, _)| l.clone()).collect();
    let label_of = |x: &f64| category_label(&labels, *x);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&dist.title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(k as f64 - 0.5), y_min..y_max)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k)
        .x_label_formatter(&label_of)
        .x_desc(dist.x_label.as_str())
        .y_desc(dist.y_label.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| e.to_string())?;

    for (i, ((_, values), profile)) in groups.iter().zip(&profiles).enumerate() {
        let center = i as f64;
        let outline = violin_outline(center, profile, 0.4);
        if outline.is_empty() {
            continue;
        }
        let stop = if k > 1 { i * (COOLWARM.len() - 1) / (k - 1) } else { 0 };
        let color = rgb(COOLWARM[stop]);

        let mut border = outline.clone();
        border.push(outline[0]);

        chart
            .draw_series(iter::once(Polygon::new(outline, color.filled())))
            .map_err(|e| e.to_string())?;
        chart
            .draw_series(iter::once(PathElement::new(border, BLACK.stroke_width(1))))
            .map_err(|e| e.to_string())?;

        if let Some(median) = median(values) {
            chart
                .draw_series(iter::once(PathElement::new(
                    vec![(center - 0.08, median), (center + 0.08, median)],
                    BLACK.stroke_width(3),
                )))
                .map_err(|e| e.to_string())?;
        }
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_angles_cover_full_circle() {
        let angles = slice_angles(&[3, 1, 4]);
        assert_eq!(angles.len(), 3);
        assert_eq!(angles[0].0, 0.0);
        assert!((angles[2].1 - 2.0 * PI).abs() < 1e-9);
        assert!((angles[0].1 - angles[1].0).abs() < 1e-12);
        assert!(slice_angles(&[0, 0]).is_empty());
    }

    #[test]
    fn test_kde_profile_integrates_to_one() {
        let values = [100.0, 110.0, 120.0, 121.0, 125.0, 140.0];
        let profile = kde_profile(&values, 400);
        let area: f64 = profile
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum();
        // Truncated at two bandwidths, so a little mass falls outside
        assert!(area > 0.9 && area <= 1.0, "area was {area}");
        assert!(profile.iter().all(|p| p.1 >= 0.0));
    }

    #[test]
    fn test_kde_peaks_near_center_of_symmetric_sample() {
        let values = [90.0, 100.0, 100.0, 110.0];
        let profile = kde_profile(&values, 201);
        let peak = profile
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        assert!((peak.0 - 100.0).abs() < 2.0);
    }

    #[test]
    fn test_scott_bandwidth_falls_back_without_spread() {
        assert_eq!(scott_bandwidth(&[120.0]), 1.0);
        assert_eq!(scott_bandwidth(&[120.0, 120.0, 120.0]), 1.0);
        assert!(scott_bandwidth(&[100.0, 120.0, 140.0]) > 0.0);
    }

    #[test]
    fn test_violin_outline_is_mirrored() {
        let profile = vec![(0.0, 0.0), (1.0, 2.0), (2.0, 1.0)];
        let outline = violin_outline(3.0, &profile, 0.4);
        assert_eq!(outline.len(), 6);
        assert!((outline[1].0 - 3.4).abs() < 1e-9);
        assert_eq!(outline[1].1, 1.0);
        assert!((outline[4].0 - 2.6).abs() < 1e-9);
        assert_eq!(outline[4].1, 1.0);
    }

    #[test]
    fn test_category_label_only_on_integer_ticks() {
        let labels = vec!["pop".to_string(), "".to_string()];
        assert_eq!(category_label(&labels, 0.0), "pop");
        assert_eq!(category_label(&labels, 1.0), "(untagged)");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_padded_range_widens_degenerate_input() {
        assert_eq!(padded_range([0.5, 0.5].into_iter()), (0.0, 1.0));
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_path_for_uses_png_extension() {
        let sink = PngChartSink::new("/tmp/charts", 100, 100);
        assert_eq!(
            sink.path_for("valence_vs_energy"),
            PathBuf::from("/tmp/charts/valence_vs_energy.png")
        );
    }
}
