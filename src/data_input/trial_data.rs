// src/data_input/trial_data.rs

use std::fmt;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Series;

/// Acquisition protocol of a trial. Determines axis semantics and the validity guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionMode {
    /// Force vs vertical depth.
    Penetration,
    /// Force vs horizontal displacement.
    Shear,
}

impl AcquisitionMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AcquisitionMode::Penetration),
            1 => Some(AcquisitionMode::Shear),
            _ => None,
        }
    }

    /// Accepts the numeric code or the protocol name, case-insensitively.
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Ok(code) = label.parse::<u8>() {
            return Self::from_code(code);
        }
        match label.to_ascii_lowercase().as_str() {
            "penetration" => Some(AcquisitionMode::Penetration),
            "shear" => Some(AcquisitionMode::Shear),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AcquisitionMode::Penetration => "Penetration",
            AcquisitionMode::Shear => "Shear",
        }
    }

    pub fn position_label(self) -> &'static str {
        match self {
            AcquisitionMode::Penetration => "Vertical Depth",
            AcquisitionMode::Shear => "Shear Length",
        }
    }

    pub fn force_label(self) -> &'static str {
        match self {
            AcquisitionMode::Penetration => "Penetration Force",
            AcquisitionMode::Shear => "Shear Force",
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One trimmed and smoothed trial, as handed to the feature pipeline.
#[derive(Debug, Clone)]
pub struct TrialData {
    pub trial_id: String,
    pub filename: String,
    pub mode: AcquisitionMode,
    pub trimmed_force: Series,
    pub trimmed_pos: Series,
    pub trimmed_time: Series,
    pub velocity: Option<Series>,
    pub smoothed_pos: Series,
    pub smoothed_force: Series,
    pub max_indices: Vec<usize>,
    pub min_indices: Vec<usize>,
    pub average_force: f64,
}

impl TrialData {
    /// Checks the structural invariants and the physical-consistency guard.
    pub fn validate(&self) -> AnalysisResult<()> {
        let n = self.trimmed_force.len();
        check_len("trimmed_pos", n, self.trimmed_pos.len())?;
        check_len("trimmed_time", n, self.trimmed_time.len())?;
        if let Some(velocity) = &self.velocity {
            check_len("velocity", n, velocity.len())?;
        }

        let smoothed_len = self.smoothed_pos.len();
        check_len("smoothed_force", smoothed_len, self.smoothed_force.len())?;
        check_indices("max_indices", &self.max_indices, smoothed_len)?;
        check_indices("min_indices", &self.min_indices, smoothed_len)?;

        if !self.average_force.is_finite() {
            return Err(AnalysisError::InvalidTrial {
                trial_id: self.trial_id.clone(),
                reason: "average force is not a finite number".to_string(),
            });
        }
        if self.mode == AcquisitionMode::Penetration && self.average_force < 0.0 {
            return Err(AnalysisError::InvalidTrial {
                trial_id: self.trial_id.clone(),
                reason: format!(
                    "negative average force {:.3} N under penetration mode",
                    self.average_force
                ),
            });
        }
        Ok(())
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> AnalysisResult<()> {
    if expected != actual {
        return Err(AnalysisError::LengthMismatch {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

// Indices must be in range and strictly increasing.
fn check_indices(name: &'static str, indices: &[usize], len: usize) -> AnalysisResult<()> {
    let mut prev: Option<usize> = None;
    for &index in indices {
        if index >= len || prev.is_some_and(|p| index <= p) {
            return Err(AnalysisError::IndexOutOfRange { name, index, len });
        }
        prev = Some(index);
    }
    Ok(())
}


// src/data_input/trial_data.rs
