// src/constants.rs

use plotters::style::colors::full_palette::ORANGE;
use plotters::style::RGBColor;

// Slopes above this ceiling (N/m) are treated as sensor artifacts and dropped
// from the per-cycle stiffness and stick-slip lists.
pub const STIFFNESS_OUTLIER_CEILING: f64 = 25_000.0;

// Default moving-average window (samples) used when preparing curves for extremum detection.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 15;

// Minimum number of samples a trial needs before it is worth segmenting.
pub const MIN_TRIAL_SAMPLES: usize = 3;

// Plot dimensions.
pub const PLOT_WIDTH: u32 = 1440;
pub const PLOT_HEIGHT: u32 = 960;

// Font sizes.
pub const FONT_SIZE_MAIN_TITLE: i32 = 28;
pub const FONT_SIZE_CHART_TITLE: i32 = 24;
pub const FONT_SIZE_AXIS_LABEL: i32 = 18;
pub const FONT_SIZE_LEGEND: i32 = 16;
pub const FONT_SIZE_MESSAGE: i32 = 22;

pub const FONT_FAMILY: &str = "sans-serif";

// --- Plot Color Assignments ---
pub const COLOR_HIGHLIGHT: &RGBColor = &ORANGE;
pub const COLOR_HIGHLIGHT_BASE: RGBColor = RGBColor(170, 170, 170);

// Marker sizes (pixels) for scatter plots.
pub const MARKER_SIZE_AGGREGATE: u32 = 6;
pub const MARKER_SIZE_COMPARISON: u32 = 9;

// Continuous plots list each trial in the legend only up to this many trials.
pub const MAX_LEGEND_TRIALS: usize = 12;

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 2;
pub const LINE_WIDTH_HIGHLIGHT: u32 = 4;
pub const LINE_WIDTH_LEGEND: u32 = 2;

// Column names written by the aggregate CSV export.
pub const EXPORT_HEADERS: [&str; 14] = [
    "filenames",
    "trial_IDs",
    "numericTags",
    "locations",
    "transects",
    "flagNums",
    "avgForce",
    "avgStiffness",
    "avgStickSlip",
    "avgYield",
    "drops",
    "drop_slopes",
    "deformations",
    "regressionStiffness",
];

// src/constants.rs
