// src/plot_functions/plot_comparison.rs

use std::error::Error;
use std::path::Path;

use crate::axis_names::AggregateField;
use crate::config::AnalysisConfig;
use crate::constants::{COLOR_HIGHLIGHT_BASE, MARKER_SIZE_COMPARISON};
use crate::data_analysis::aggregate_store::AggregateSnapshot;
use crate::data_analysis::cross_protocol::{align, common_trial_ids, PairedSeries};
use crate::data_input::trial_data::AcquisitionMode;
use crate::plot_framework::{data_ranges, draw_single_plot, MarkerPalette, MarkerSeries, PlotConfig};
use crate::types::ScatterData;

/// Axis title carrying the protocol the values come from.
pub fn comparison_axis_title(mode: AcquisitionMode, field: AggregateField) -> String {
    format!("{} {}{}", mode.name(), field.label(), field.unit())
}

/// Scatter of penetration values (x) against shear values (y), one point per shared trial ID.
pub fn build_comparison_config(
    paired: &PairedSeries,
    tag_count: usize,
    x: AggregateField,
    y: AggregateField,
) -> Option<PlotConfig> {
    let data: ScatterData = paired.points().map(|(a, b, tag)| (a, b, tag as f64)).collect();
    let (x_range, y_range) = data_ranges(data.iter().map(|&(a, b, _)| (a, b)))?;

    Some(PlotConfig {
        title: format!("Shear {} vs Penetration {}", y.label(), x.label()),
        x_range,
        y_range,
        series: Vec::new(),
        markers: vec![MarkerSeries {
            data,
            label: String::new(),
            legend_color: COLOR_HIGHLIGHT_BASE,
            size: MARKER_SIZE_COMPARISON,
            palette: MarkerPalette::Viridis(tag_count),
        }],
        x_label: comparison_axis_title(AcquisitionMode::Penetration, x),
        y_label: comparison_axis_title(AcquisitionMode::Shear, y),
    })
}

/// Cross-references two protocol snapshots by trial ID and renders the pairs.
/// Fails when either snapshot repeats a trial ID.
pub fn plot_comparison(
    penetration: &AggregateSnapshot,
    shear: &AggregateSnapshot,
    x: AggregateField,
    y: AggregateField,
    config: &AnalysisConfig,
    output_path: &Path,
) -> Result<bool, Box<dyn Error>> {
    let ids = common_trial_ids(penetration, shear);
    println!(
        "Found {} trial IDs shared by {} penetration and {} shear trials.",
        ids.len(),
        penetration.len(),
        shear.len()
    );
    let paired = align(penetration, shear, &ids, x, y)?;
    let root_name = format!("Penetration vs Shear ({} shared trials)", paired.len());
    let plot_config = build_comparison_config(&paired, penetration.len(), x, y);
    draw_single_plot(output_path, config.output_format, &root_name, "Comparison", plot_config.as_ref())
}
