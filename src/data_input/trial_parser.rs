// src/data_input/trial_parser.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::Array1;
use tracing::{debug, warn};

use crate::constants::MIN_TRIAL_SAMPLES;
use crate::data_analysis::derivative::calculate_derivative;
use crate::data_analysis::smoothing::{find_local_extrema, moving_average_smooth};
use crate::data_input::trial_data::{AcquisitionMode, TrialData};
use crate::error::{AnalysisError, AnalysisResult};

// Accepted header spellings per column, compared case-insensitively after trimming.
const TIME_HEADERS: [&str; 3] = ["time", "time (s)", "t"];
const POSITION_HEADERS: [&str; 4] = ["position", "position (m)", "pos", "depth (m)"];
const FORCE_HEADERS: [&str; 2] = ["force", "force (n)"];
const VELOCITY_HEADERS: [&str; 2] = ["velocity", "velocity (m/s)"];

const TRIAL_ID_KEYS: [&str; 3] = ["trial_id", "trial id", "id"];
const MODE_KEYS: [&str; 2] = ["mode", "protocol"];

/// Trimmed series read from a trial file, before smoothing and extremum detection.
#[derive(Debug, Clone)]
pub struct RawTrial {
    pub trial_id: String,
    pub filename: String,
    pub mode: AcquisitionMode,
    pub time: Array1<f64>,
    pub position: Array1<f64>,
    pub force: Array1<f64>,
    pub velocity: Option<Array1<f64>>,
}

impl RawTrial {
    /// Smooths the curve, locates its extrema and derives velocity when none was recorded.
    pub fn prepare(self, smoothing_window: usize) -> TrialData {
        let smoothed_pos = moving_average_smooth(&self.position, smoothing_window);
        let smoothed_force = moving_average_smooth(&self.force, smoothing_window);
        let (max_indices, min_indices) = find_local_extrema(&smoothed_force);
        let velocity = self
            .velocity
            .or_else(|| Some(calculate_derivative(&smoothed_pos, &self.time)).filter(|v| !v.is_empty()));
        let average_force = self.force.mean().unwrap_or(f64::NAN);

        debug!(
            trial = %self.trial_id,
            maxima = max_indices.len(),
            minima = min_indices.len(),
            "prepared curve"
        );

        TrialData {
            trial_id: self.trial_id,
            filename: self.filename,
            mode: self.mode,
            trimmed_force: self.force,
            trimmed_pos: self.position,
            trimmed_time: self.time,
            velocity,
            smoothed_pos,
            smoothed_force,
            max_indices,
            min_indices,
            average_force,
        }
    }
}

/// Reads a trial file and prepares it for feature extraction.
pub fn load_trial(path: &Path, smoothing_window: usize) -> AnalysisResult<TrialData> {
    Ok(parse_trial_file(path)?.prepare(smoothing_window))
}

/// Parses a trial CSV file.
///
/// Lines before the column header row are read as `key,value` metadata; the
/// `trial_id` and `mode` keys are recognised. Without a `trial_id` entry the
/// file stem is used. The header row must name time, position and force
/// columns; a velocity column is optional. Rows with unparseable values in a
/// required column are skipped.
pub fn parse_trial_file(path: &Path) -> AnalysisResult<RawTrial> {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    // --- Metadata Extraction ---
    let mut metadata: Vec<(String, String)> = Vec::new();
    let mut csv_lines: Vec<String> = Vec::new();
    let mut found_csv_headers = false;
    {
        let reader = BufReader::new(File::open(path)?);
        for line_result in reader.lines() {
            let line = line_result?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() {
                continue;
            }

            if !found_csv_headers && looks_like_header(trimmed_line) {
                found_csv_headers = true;
                csv_lines.push(line);
                continue;
            }

            if found_csv_headers {
                csv_lines.push(line);
            } else if let Some((key, value)) = parse_metadata_line(trimmed_line) {
                metadata.push((key, value));
            }
        }
    }

    if !found_csv_headers {
        return Err(AnalysisError::MissingColumn {
            path: path.to_path_buf(),
            column: "force",
        });
    }

    let lookup = |keys: &[&str]| -> Option<&str> {
        metadata
            .iter()
            .find(|(k, _)| keys.contains(&k.to_ascii_lowercase().as_str()))
            .map(|(_, v)| v.as_str())
    };

    let trial_id = match lookup(&TRIAL_ID_KEYS) {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().split('_').next().unwrap_or_default().to_string())
            .unwrap_or_default(),
    };

    let mode = match lookup(&MODE_KEYS) {
        Some(label) => AcquisitionMode::parse_label(label).ok_or_else(|| AnalysisError::InvalidTrial {
            trial_id: trial_id.clone(),
            reason: format!("unknown acquisition mode '{label}'"),
        })?,
        None => {
            warn!(file = %filename, "no acquisition mode in metadata, assuming penetration");
            AcquisitionMode::Penetration
        }
    };

    // --- Header Index Mapping ---
    let csv_content = csv_lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_content.as_bytes());
    let header_record = reader.headers()?.clone();
    let find_column = |names: &[&str]| {
        header_record
            .iter()
            .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
    };
    let missing = |column: &'static str| AnalysisError::MissingColumn {
        path: path.to_path_buf(),
        column,
    };
    let time_idx = find_column(&TIME_HEADERS).ok_or_else(|| missing("time"))?;
    let pos_idx = find_column(&POSITION_HEADERS).ok_or_else(|| missing("position"))?;
    let force_idx = find_column(&FORCE_HEADERS).ok_or_else(|| missing("force"))?;
    let velocity_idx = find_column(&VELOCITY_HEADERS);

    // --- Data Reading ---
    let mut time = Vec::new();
    let mut position = Vec::new();
    let mut force = Vec::new();
    let mut velocity = Vec::new();
    let mut velocity_complete = velocity_idx.is_some();

    for (row_index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %filename, row = row_index + 1, "skipping row: {e}");
                continue;
            }
        };
        let parse_at = |idx: usize| record.get(idx).and_then(|v| v.parse::<f64>().ok());

        match (parse_at(time_idx), parse_at(pos_idx), parse_at(force_idx)) {
            (Some(t), Some(p), Some(f)) => {
                time.push(t);
                position.push(p);
                force.push(f);
                if let Some(idx) = velocity_idx {
                    match parse_at(idx) {
                        Some(v) => velocity.push(v),
                        None => velocity_complete = false,
                    }
                }
            }
            _ => warn!(
                file = %filename,
                row = row_index + 1,
                "skipping row with missing or invalid time/position/force"
            ),
        }
    }

    if time.len() < MIN_TRIAL_SAMPLES {
        return Err(AnalysisError::InvalidTrial {
            trial_id,
            reason: format!("only {} usable samples", time.len()),
        });
    }

    if velocity_idx.is_some() && !velocity_complete {
        warn!(file = %filename, "velocity column incomplete, deriving velocity from position");
    }

    Ok(RawTrial {
        trial_id,
        filename,
        mode,
        time: Array1::from(time),
        position: Array1::from(position),
        force: Array1::from(force),
        velocity: velocity_complete.then(|| Array1::from(velocity)),
    })
}

fn looks_like_header(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("force") && (lower.contains("pos") || lower.contains("depth"))
}

fn parse_metadata_line(line: &str) -> Option<(String, String)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let record = rdr.records().next()?.ok()?;
    if record.len() < 2 {
        return None;
    }
    let key = record.get(0)?.trim().trim_matches('"').to_string();
    let value = record.get(1)?.trim().trim_matches('"').to_string();
    (!key.is_empty()).then_some((key, value))
}
