// src/plot_functions/plot_aggregate.rs

use std::error::Error;
use std::path::Path;

use crate::axis_names::{AggregateAxis, PlotAxis};
use crate::config::AnalysisConfig;
use crate::constants::{COLOR_HIGHLIGHT, COLOR_HIGHLIGHT_BASE, MARKER_SIZE_AGGREGATE};
use crate::data_analysis::aggregate_store::AggregateSnapshot;
use crate::data_input::feature_file::FeatureDictionary;
use crate::data_input::trial_data::AcquisitionMode;
use crate::plot_framework::{data_ranges, draw_single_plot, MarkerPalette, MarkerSeries, PlotConfig};
use crate::types::{Column, ScatterData};

/// Values of an aggregate axis aligned to the snapshot, pulling feature
/// overlays from `features`.
pub fn axis_column(snapshot: &AggregateSnapshot, axis: &AggregateAxis, features: &FeatureDictionary) -> Column {
    match axis {
        AggregateAxis::Field(field) => snapshot.column(*field),
        AggregateAxis::Feature(name) => features.match_numeric(snapshot, name),
    }
}

/// Scatter of one point per trial. Without a highlight tag points are
/// coloured by numeric tag; with one, tagged trials are drawn over the rest
/// in the highlight colour and both groups get a legend entry.
pub fn build_aggregate_config(
    snapshot: &AggregateSnapshot,
    x: &AggregateAxis,
    y: &AggregateAxis,
    features: &FeatureDictionary,
    highlight: Option<&str>,
) -> Option<PlotConfig> {
    let xs = axis_column(snapshot, x, features);
    let ys = axis_column(snapshot, y, features);
    let mask = highlight.map(|tag| features.highlight_mask(snapshot, tag));

    let mut base: ScatterData = Vec::new();
    let mut highlighted: ScatterData = Vec::new();
    for (i, (vx, vy)) in xs.iter().zip(&ys).enumerate() {
        let (Some(vx), Some(vy)) = (*vx, *vy) else {
            continue;
        };
        let point = (vx, vy, snapshot.numeric_tags[i] as f64);
        match &mask {
            Some(mask) if mask[i] => highlighted.push(point),
            _ => base.push(point),
        }
    }

    let (x_range, y_range) = data_ranges(base.iter().chain(&highlighted).map(|&(a, b, _)| (a, b)))?;

    let markers = match highlight {
        None => vec![MarkerSeries {
            data: base,
            label: String::new(),
            legend_color: COLOR_HIGHLIGHT_BASE,
            size: MARKER_SIZE_AGGREGATE,
            palette: MarkerPalette::Viridis(snapshot.len()),
        }],
        Some(tag) => vec![
            MarkerSeries {
                data: base,
                label: "Other trials".to_string(),
                legend_color: COLOR_HIGHLIGHT_BASE,
                size: MARKER_SIZE_AGGREGATE,
                palette: MarkerPalette::Solid,
            },
            MarkerSeries {
                data: highlighted,
                label: tag.to_string(),
                legend_color: *COLOR_HIGHLIGHT,
                size: MARKER_SIZE_AGGREGATE,
                palette: MarkerPalette::Solid,
            },
        ],
    };

    let x_axis = PlotAxis::Aggregate(x.clone());
    let y_axis = PlotAxis::Aggregate(y.clone());
    Some(PlotConfig {
        title: format!("{} vs {}", y_axis.label(), x_axis.label()),
        x_range,
        y_range,
        series: Vec::new(),
        markers,
        x_label: x_axis.title(),
        y_label: y_axis.title(),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn plot_aggregate(
    snapshot: &AggregateSnapshot,
    mode: Option<AcquisitionMode>,
    x: &AggregateAxis,
    y: &AggregateAxis,
    features: &FeatureDictionary,
    highlight: Option<&str>,
    config: &AnalysisConfig,
    output_path: &Path,
) -> Result<bool, Box<dyn Error>> {
    let root_name = match mode {
        Some(mode) => format!("{mode} aggregate ({} trials)", snapshot.len()),
        None => "Aggregate".to_string(),
    };
    let plot_config = build_aggregate_config(snapshot, x, y, features, highlight);
    draw_single_plot(output_path, config.output_format, &root_name, "Aggregate", plot_config.as_ref())
}
