// src/types.rs
// Type aliases shared by the analysis and plotting layers

use ndarray::Array1;

/// A numeric series sampled along one trial.
pub type Series = Array1<f64>;

/// Index pair `(min_idx, max_idx)` into a smoothed curve.
pub type ExtremumPair = (usize, usize);

/// One scalar column of the aggregate snapshot; `None` marks a missing value.
pub type Column = Vec<Option<f64>>;

/// Scatter points paired with the colour key used for each point.
pub type ScatterData = Vec<(f64, f64, f64)>;

/// Axis ranges computed for a chart.
pub type PlotRanges = (std::ops::Range<f64>, std::ops::Range<f64>);

// src/types.rs
