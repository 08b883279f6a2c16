// src/data_analysis/feature_extractor.rs

use tracing::debug;

use crate::constants::STIFFNESS_OUTLIER_CEILING;
use crate::data_analysis::cycle_segmenter::{segment_cycles, segment_drops, Cycle};
use crate::data_input::trial_data::TrialData;

/// Per-cycle features of one trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleFeatures {
    /// Slope of force vs position over each retained cycle (N/m).
    pub stiffness: Vec<f64>,
    /// Tear length of each retained cycle (m), index-aligned with `stiffness`.
    pub stick_slip: Vec<f64>,
    /// Mean force over every local maximum; NaN when the trial has none.
    pub average_yield: f64,
}

/// The largest single force decrease from a local maximum to the following minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceDrop {
    pub magnitude: f64,
    pub slope: f64,
    pub deformation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialFeatures {
    pub cycles: CycleFeatures,
    pub max_drop: Option<ForceDrop>,
    /// Through-origin least-squares slope of the loading ramp (N/m).
    pub regression_stiffness: Option<f64>,
}

/// Computes stiffness and tear length for each cycle and the average yield.
///
/// Cycles whose slope exceeds [`STIFFNESS_OUTLIER_CEILING`] are dropped from
/// both lists. The average yield always covers every maximum in
/// `max_indices`, regardless of pairing or outlier exclusion.
pub fn extract_cycle_features(
    position: &[f64],
    force: &[f64],
    max_indices: &[usize],
    cycles: &[Cycle],
) -> CycleFeatures {
    let mut stiffness = Vec::with_capacity(cycles.len());
    let mut stick_slip = Vec::with_capacity(cycles.len());

    for cycle in cycles {
        let tear = position[cycle.max_idx] - position[cycle.min_idx];
        let slope = (force[cycle.max_idx] - force[cycle.min_idx]) / tear;
        if slope > STIFFNESS_OUTLIER_CEILING {
            debug!(slope, min_idx = cycle.min_idx, "discarding outlier slope");
            continue;
        }
        stiffness.push(slope);
        stick_slip.push(tear);
    }

    let yields: Vec<f64> = max_indices
        .iter()
        .filter_map(|&i| force.get(i).copied())
        .collect();

    CycleFeatures {
        stiffness,
        stick_slip,
        average_yield: mean(&yields),
    }
}

/// Picks the drop pair with the greatest positive force decrease (first wins on ties).
pub fn extract_max_drop(position: &[f64], force: &[f64], drops: &[Cycle]) -> Option<ForceDrop> {
    let mut best: Option<ForceDrop> = None;
    for drop in drops {
        let magnitude = force[drop.max_idx] - force[drop.min_idx];
        if magnitude <= 0.0 || best.is_some_and(|b| magnitude <= b.magnitude) {
            continue;
        }
        let deformation = position[drop.min_idx] - position[drop.max_idx];
        best = Some(ForceDrop {
            magnitude,
            slope: magnitude / deformation,
            deformation,
        });
    }
    best
}

/// Stiffness as the slope of `force = k * position` fitted by least squares.
///
/// The fit covers samples from the first local minimum up to (excluding) the
/// first local maximum. If that maximum comes before the minimum the fit
/// starts at sample 0 instead. Without extrema the whole curve is used.
/// Returns `None` when the range is empty or every position in it is zero.
pub fn regression_stiffness(
    position: &[f64],
    force: &[f64],
    max_indices: &[usize],
    min_indices: &[usize],
) -> Option<f64> {
    let len = position.len().min(force.len());
    let (start, end) = match (min_indices.first(), max_indices.first()) {
        (Some(&first_min), Some(&first_max)) => {
            let end = first_max.min(len);
            (if first_min > end { 0 } else { first_min }, end)
        }
        _ => (0, len),
    };

    let (sxx, sxy) = position[start..end]
        .iter()
        .zip(&force[start..end])
        .filter(|(x, f)| x.is_finite() && f.is_finite())
        .fold((0.0, 0.0), |(sxx, sxy), (&x, &f)| (sxx + x * x, sxy + x * f));
    if sxx > 0.0 {
        Some(sxy / sxx)
    } else {
        debug!(start, end, "no positional spread for the stiffness fit");
        None
    }
}

/// Runs segmentation and feature extraction on the smoothed curve of a trial.
/// The regression fit uses the trimmed curve, bounded by the smoothed extrema.
pub fn extract_features(trial: &TrialData) -> TrialFeatures {
    let position = trial.smoothed_pos.to_vec();
    let force = trial.smoothed_force.to_vec();

    let cycles = segment_cycles(&position, &force, &trial.max_indices, &trial.min_indices);
    let cycle_features = extract_cycle_features(&position, &force, &trial.max_indices, &cycles);

    let drops = segment_drops(&position, &force, &trial.max_indices, &trial.min_indices);
    let max_drop = extract_max_drop(&position, &force, &drops);

    let regression = regression_stiffness(
        &trial.trimmed_pos.to_vec(),
        &trial.trimmed_force.to_vec(),
        &trial.max_indices,
        &trial.min_indices,
    );

    TrialFeatures {
        cycles: cycle_features,
        max_drop,
        regression_stiffness: regression,
    }
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
