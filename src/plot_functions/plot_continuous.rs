// src/plot_functions/plot_continuous.rs

use std::error::Error;
use std::path::Path;

use crate::axis_names::{ContinuousField, PlotAxis};
use crate::config::AnalysisConfig;
use crate::constants::{LINE_WIDTH_HIGHLIGHT, LINE_WIDTH_PLOT, MAX_LEGEND_TRIALS};
use crate::data_analysis::aggregate_store::AggregateStore;
use crate::data_analysis::trial_record::TrialRecord;
use crate::data_input::feature_file::FeatureDictionary;
use crate::data_input::trial_data::AcquisitionMode;
use crate::plot_framework::{
    data_ranges, draw_single_plot, map_highlight_color, map_tag_to_color, PlotConfig, PlotSeries,
};
use crate::types::Series;

/// The per-sample series of `record` behind a continuous axis. `None` only for
/// velocity on a trial without one.
pub fn continuous_values(record: &TrialRecord, field: ContinuousField) -> Option<&Series> {
    match field {
        ContinuousField::Position => Some(&record.pos),
        ContinuousField::Time => Some(&record.time),
        ContinuousField::Force => Some(&record.force),
        ContinuousField::Velocity => record.velocity.as_ref(),
    }
}

/// Axis title, using the protocol-specific wording for position and force.
pub fn continuous_axis_title(field: ContinuousField, mode: Option<AcquisitionMode>) -> String {
    match (field, mode) {
        (ContinuousField::Position, Some(mode)) => format!("{}{}", mode.position_label(), field.unit()),
        (ContinuousField::Force, Some(mode)) => format!("{}{}", mode.force_label(), field.unit()),
        _ => PlotAxis::Continuous(field).title(),
    }
}

fn trial_line(record: &TrialRecord, x: ContinuousField, y: ContinuousField) -> Option<Vec<(f64, f64)>> {
    let xs = continuous_values(record, x)?;
    let ys = continuous_values(record, y)?;
    Some(
        xs.iter()
            .zip(ys.iter())
            .map(|(&a, &b)| (a, b))
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .collect(),
    )
}

/// One line per record, coloured along viridis in record order.
///
/// With a highlight tag, trials carrying the tag are drawn last with a wider
/// line on a separate colour ramp. The legend then shows one entry per group,
/// `<tag>` and `~<tag>`, instead of one per trial.
pub fn build_continuous_config(
    records: &[&TrialRecord],
    x: ContinuousField,
    y: ContinuousField,
    features: &FeatureDictionary,
    highlight: Option<&str>,
) -> Option<PlotConfig> {
    let mode = records.first().map(|r| r.mode);

    let series: Vec<PlotSeries> = match highlight {
        None => {
            let show_legend = records.len() <= MAX_LEGEND_TRIALS;
            records
                .iter()
                .enumerate()
                .filter_map(|(i, record)| {
                    Some(PlotSeries {
                        data: trial_line(record, x, y)?,
                        label: if show_legend { record.id().to_string() } else { String::new() },
                        color: map_tag_to_color(i, records.len()),
                        stroke_width: LINE_WIDTH_PLOT,
                    })
                })
                .collect()
        }
        Some(tag) => {
            let (tagged, others): (Vec<&TrialRecord>, Vec<&TrialRecord>) =
                records.iter().copied().partition(|r| features.has_tag(r.id(), tag));
            let group = |members: &[&TrialRecord], label: String, highlighted: bool| -> Vec<PlotSeries> {
                members
                    .iter()
                    .filter_map(|record| trial_line(record, x, y))
                    .enumerate()
                    .map(|(i, data)| PlotSeries {
                        data,
                        label: if i == 0 { label.clone() } else { String::new() },
                        color: if highlighted {
                            map_highlight_color(i, members.len())
                        } else {
                            map_tag_to_color(i, members.len())
                        },
                        stroke_width: if highlighted { LINE_WIDTH_HIGHLIGHT } else { LINE_WIDTH_PLOT },
                    })
                    .collect()
            };
            let mut series = group(&others, format!("~{tag}"), false);
            series.extend(group(&tagged, tag.to_string(), true));
            series
        }
    };

    let (x_range, y_range) = data_ranges(series.iter().flat_map(|s| s.data.iter().copied()))?;
    let x_label = continuous_axis_title(x, mode);
    let y_label = continuous_axis_title(y, mode);

    Some(PlotConfig {
        title: format!("{} vs {}", y.label(), x.label()),
        x_range,
        y_range,
        series,
        markers: Vec::new(),
        x_label,
        y_label,
    })
}

/// Renders the active trials of `store` as one continuous chart.
pub fn plot_continuous(
    store: &AggregateStore,
    x: ContinuousField,
    y: ContinuousField,
    features: &FeatureDictionary,
    highlight: Option<&str>,
    config: &AnalysisConfig,
    output_path: &Path,
) -> Result<bool, Box<dyn Error>> {
    let records: Vec<&TrialRecord> = store
        .records()
        .iter()
        .filter(|r| store.is_active(&r.filename))
        .collect();
    let root_name = match store.mode() {
        Some(mode) => format!("{mode} trials ({})", records.len()),
        None => "No trials".to_string(),
    };
    let plot_config = build_continuous_config(&records, x, y, features, highlight);
    draw_single_plot(output_path, config.output_format, &root_name, "Continuous", plot_config.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_analysis::trial_record::tests::record;
    use crate::data_input::feature_file::FeatureFile;
    use plotters::style::RGBColor;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn one_series_per_trial() {
        let a = record("L1T1F1", "a.csv", AcquisitionMode::Penetration);
        let b = record("L1T1F2", "b.csv", AcquisitionMode::Penetration);
        let config = build_continuous_config(
            &[&a, &b],
            ContinuousField::Position,
            ContinuousField::Force,
            &FeatureDictionary::new(),
            None,
        )
        .unwrap();

        assert_eq!(config.series.len(), 2);
        assert_eq!(config.series[0].data.len(), 5);
        assert_eq!(config.series[1].label, "L1T1F2");
        assert_eq!(config.x_label, "Vertical Depth (meters)");
        assert_eq!(config.y_label, "Penetration Force (N)");
        assert!(config.x_range.start < 0.0 && config.x_range.end > 1.0);
    }

    #[test]
    fn missing_velocity_skips_the_trial() {
        let mut a = record("L1T1F1", "a.csv", AcquisitionMode::Shear);
        a.velocity = None;
        let features = FeatureDictionary::new();
        assert!(
            build_continuous_config(&[&a], ContinuousField::Time, ContinuousField::Velocity, &features, None).is_none()
        );
        assert_eq!(continuous_axis_title(ContinuousField::Velocity, Some(AcquisitionMode::Shear)), "Velocity (m/s)");
    }

    #[test]
    fn highlighted_trials_are_grouped_and_drawn_last() {
        let a = record("L1T1F1", "a.csv", AcquisitionMode::Penetration);
        let b = record("L1T1F2", "b.csv", AcquisitionMode::Penetration);
        let c = record("L1T1F3", "c.csv", AcquisitionMode::Penetration);
        let mut features = FeatureDictionary::new();
        features.insert(FeatureFile {
            name: "surface".to_string(),
            tags: BTreeMap::from([("crust".to_string(), vec!["L1T1F1".to_string()])]),
            values: HashMap::new(),
        });

        let config = build_continuous_config(
            &[&a, &b, &c],
            ContinuousField::Position,
            ContinuousField::Force,
            &features,
            Some("crust"),
        )
        .unwrap();

        let labels: Vec<&str> = config.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["~crust", "", "crust"]);
        let last = &config.series[2];
        assert_eq!(last.stroke_width, LINE_WIDTH_HIGHLIGHT);
        assert_eq!(config.series[0].stroke_width, LINE_WIDTH_PLOT);
        let rgb = |c: RGBColor| (c.0, c.1, c.2);
        assert_eq!(rgb(last.color), rgb(map_highlight_color(0, 1)));
        assert_ne!(rgb(last.color), rgb(config.series[0].color));
    }

    #[test]
    fn unknown_tag_leaves_every_trial_in_the_base_group() {
        let a = record("L1T1F1", "a.csv", AcquisitionMode::Shear);
        let config = build_continuous_config(
            &[&a],
            ContinuousField::Position,
            ContinuousField::Force,
            &FeatureDictionary::new(),
            Some("crust"),
        )
        .unwrap();
        assert_eq!(config.series.len(), 1);
        assert_eq!(config.series[0].label, "~crust");
    }
}
