// src/plot_framework.rs

use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::{Color, IntoFont, RGBColor};

use ndarray::Array1;
use ndarray_stats::QuantileExt;

use std::error::Error;
use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::config::OutputFormat;
use crate::constants::{
    FONT_FAMILY, FONT_SIZE_AXIS_LABEL, FONT_SIZE_CHART_TITLE, FONT_SIZE_LEGEND, FONT_SIZE_MAIN_TITLE,
    FONT_SIZE_MESSAGE, LINE_WIDTH_LEGEND, PLOT_HEIGHT, PLOT_WIDTH,
};
use crate::types::{PlotRanges, ScatterData};

/// Calculate plot range with padding.
/// Adds 15% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.5 } else { range * 0.15 };
    (min - padding, max + padding)
}

/// Padded x and y ranges covering every finite point, or `None` when there is none.
pub fn data_ranges<I>(points: I) -> Option<PlotRanges>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (xs, ys): (Vec<f64>, Vec<f64>) = points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();
    if xs.is_empty() {
        return None;
    }
    let xs = Array1::from(xs);
    let ys = Array1::from(ys);
    let (x_min, x_max) = calculate_range(*xs.min_skipnan(), *xs.max_skipnan());
    let (y_min, y_max) = calculate_range(*ys.min_skipnan(), *ys.max_skipnan());
    Some((x_min..x_max, y_min..y_max))
}

/// Tick label text: `k`/`M` suffixes for large magnitudes, scientific
/// notation for very small ones, otherwise just enough decimals to tell
/// neighbouring ticks apart.
pub fn format_axis_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1000.0 {
        format!("{:.1}k", value / 1000.0)
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else if magnitude < 0.01 {
        format!("{value:.1e}")
    } else if magnitude < 1.0 {
        format!("{value:.3}")
    } else if magnitude < 10.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

fn ramp_position(tag: usize, count: usize) -> f64 {
    let span = count.saturating_sub(1).max(1) as f64;
    (tag as f64 / span).clamp(0.0, 1.0)
}

fn to_rgb(color: colorous::Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Viridis colour for tag `tag` out of `count` tags.
pub fn map_tag_to_color(tag: usize, count: usize) -> RGBColor {
    to_rgb(colorous::VIRIDIS.eval_continuous(ramp_position(tag, count)))
}

/// Colour for highlighted series, from the darker half of the reds ramp.
pub fn map_highlight_color(tag: usize, count: usize) -> RGBColor {
    to_rgb(colorous::REDS.eval_continuous(0.5 + 0.5 * ramp_position(tag, count)))
}

/// Line series, one per trial in continuous plots.
#[derive(Clone)]
pub struct PlotSeries {
    pub data: Vec<(f64, f64)>,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
}

/// Scatter markers. `data` carries a colour key per point that `palette`
/// turns into the marker colour; `legend_color` is used for the legend entry.
#[derive(Clone)]
pub struct MarkerSeries {
    pub data: ScatterData,
    pub label: String,
    pub legend_color: RGBColor,
    pub size: u32,
    pub palette: MarkerPalette,
}

#[derive(Clone, Copy)]
pub enum MarkerPalette {
    /// Every marker uses `legend_color`.
    Solid,
    /// Colour key is a tag index into a viridis ramp of this many tags.
    Viridis(usize),
}

impl MarkerSeries {
    fn color_of(&self, key: f64) -> RGBColor {
        match self.palette {
            MarkerPalette::Solid => self.legend_color,
            MarkerPalette::Viridis(count) => map_tag_to_color(key.max(0.0) as usize, count),
        }
    }
}

#[derive(Clone)]
pub struct PlotConfig {
    pub title: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub series: Vec<PlotSeries>,
    pub markers: Vec<MarkerSeries>,
    pub x_label: String,
    pub y_label: String,
}

impl PlotConfig {
    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.data.is_empty()) || self.markers.iter().any(|m| !m.data.is_empty())
    }
}

/// Draw a "Data Unavailable" message on a plot area.
pub fn draw_unavailable_message<DB>(
    area: &DrawingArea<DB, Shift>,
    plot_type: &str,
    reason: &str,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const LINE_HEIGHT_SPACING: i32 = 4;

    let (x_range, y_range) = area.get_pixel_range();
    let (width, height) = (
        (x_range.end - x_range.start) as u32,
        (y_range.end - y_range.start) as u32,
    );
    let message = format!("{plot_type} Data Unavailable:\n{reason}");

    let estimated_char_width = (FONT_SIZE_MESSAGE as f32 * CHAR_WIDTH_RATIO) as i32;
    let estimated_line_height = FONT_SIZE_MESSAGE + LINE_HEIGHT_SPACING;

    let lines: Vec<&str> = message.split('\n').collect();
    let max_line_length = lines.iter().map(|line| line.len()).max().unwrap_or(0);
    let estimated_text_width = max_line_length.saturating_mul(estimated_char_width as usize) as i32;

    let center_x = width as i32 / 2 - estimated_text_width / 2;
    let mut y = height as i32 / 2 - (lines.len() as i32 * estimated_line_height) / 2;
    for line in lines {
        let text_style = (FONT_FAMILY, FONT_SIZE_MESSAGE).into_font().color(&RED);
        area.draw(&Text::new(line.to_string(), (center_x, y), text_style))?;
        y += estimated_line_height;
    }
    Ok(())
}

fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, plot_config: &PlotConfig) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .caption(&plot_config.title, (FONT_FAMILY, FONT_SIZE_CHART_TITLE))
        .margin(5)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(plot_config.x_range.clone(), plot_config.y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(&plot_config.x_label)
        .y_desc(&plot_config.y_label)
        .x_labels(15)
        .y_labels(10)
        .x_label_formatter(&|x| format_axis_value(*x))
        .y_label_formatter(&|y| format_axis_value(*y))
        .light_line_style(WHITE.mix(0.7))
        .label_style((FONT_FAMILY, FONT_SIZE_AXIS_LABEL))
        .draw()?;

    let mut legend_series_count = 0;

    for s in &plot_config.series {
        if s.data.is_empty() {
            continue;
        }
        let series = chart.draw_series(LineSeries::new(
            s.data.iter().cloned(),
            s.color.stroke_width(s.stroke_width),
        ))?;
        if !s.label.is_empty() {
            series.label(&s.label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], s.color.stroke_width(LINE_WIDTH_LEGEND))
            });
            legend_series_count += 1;
        }
    }

    for m in &plot_config.markers {
        if m.data.is_empty() {
            continue;
        }
        let series = chart.draw_series(
            m.data
                .iter()
                .map(|&(x, y, key)| Circle::new((x, y), m.size, m.color_of(key).filled())),
        )?;
        if !m.label.is_empty() {
            let (color, size) = (m.legend_color, m.size);
            series
                .label(&m.label)
                .legend(move |(x, y)| Circle::new((x + 10, y), size, color.filled()));
            legend_series_count += 1;
        }
    }

    if legend_series_count > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT_FAMILY, FONT_SIZE_LEGEND))
            .draw()?;
    }
    Ok(())
}

fn draw_plot_on<DB>(
    root_area: DrawingArea<DB, Shift>,
    root_name: &str,
    plot_type_name: &str,
    plot_config: Option<&PlotConfig>,
) -> Result<bool, Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root_area.fill(&WHITE)?;
    root_area.draw(&Text::new(
        root_name.to_string(),
        (10, 10),
        (FONT_FAMILY, FONT_SIZE_MAIN_TITLE).into_font().color(&BLACK),
    ))?;
    let area = root_area.margin(50, 5, 5, 5);

    let plotted = match plot_config {
        Some(config) => {
            let valid_ranges = config.x_range.end > config.x_range.start && config.y_range.end > config.y_range.start;
            if config.has_data() && valid_ranges {
                draw_chart(&area, config)?;
                true
            } else {
                let reason = if !config.has_data() { "No data points" } else { "Invalid ranges" };
                draw_unavailable_message(&area, plot_type_name, reason)?;
                false
            }
        }
        None => {
            draw_unavailable_message(&area, plot_type_name, "No data points")?;
            false
        }
    };
    root_area.present()?;
    Ok(plotted)
}

/// Renders one chart to `output_path` with the backend matching `format`.
/// Returns whether any data was drawn; a placeholder image is written either way.
pub fn draw_single_plot(
    output_path: &Path,
    format: OutputFormat,
    root_name: &str,
    plot_type_name: &str,
    plot_config: Option<&PlotConfig>,
) -> Result<bool, Box<dyn Error>> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let plotted = match format {
        OutputFormat::Png => {
            let root = BitMapBackend::new(output_path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
            draw_plot_on(root, root_name, plot_type_name, plot_config)?
        }
        OutputFormat::Svg => {
            let root = SVGBackend::new(output_path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
            draw_plot_on(root, root_name, plot_type_name, plot_config)?
        }
    };

    if plotted {
        println!("  Plot saved as '{}'.", output_path.display());
    } else {
        println!(
            "  '{}' written with a placeholder: no data available to plot.",
            output_path.display()
        );
    }
    Ok(plotted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_padded_and_ordered() {
        assert_eq!(calculate_range(10.0, 0.0), (-1.5, 11.5));
        assert_eq!(calculate_range(2.0, 2.0), (1.5, 2.5));
    }

    #[test]
    fn data_ranges_skip_non_finite_points() {
        let ranges = data_ranges(vec![(0.0, 1.0), (f64::NAN, 5.0), (10.0, 3.0)]).unwrap();
        assert_eq!(ranges.0, -1.5..11.5);
        assert!((ranges.1.start - 0.7).abs() < 1e-9);
        assert!(data_ranges(vec![(f64::NAN, 1.0)]).is_none());
    }

    #[test]
    fn viridis_endpoints_differ() {
        let first = map_tag_to_color(0, 10);
        let last = map_tag_to_color(9, 10);
        assert_ne!((first.0, first.1, first.2), (last.0, last.1, last.2));
        let only = map_tag_to_color(0, 1);
        assert_eq!((only.0, only.1, only.2), (first.0, first.1, first.2));
    }

    #[test]
    fn highlight_ramp_is_distinct_from_viridis() {
        let base = map_tag_to_color(0, 3);
        let highlight = map_highlight_color(0, 3);
        assert_ne!((base.0, base.1, base.2), (highlight.0, highlight.1, highlight.2));
        // reds: red channel dominates
        assert!(highlight.0 > highlight.2);
    }
}
