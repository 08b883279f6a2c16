// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the analysis core.
///
/// None of these abort a batch: the offending trial or feature file is logged
/// and skipped by the caller. A trial with no qualifying stick-slip cycle is
/// not an error at all; it simply yields empty feature lists.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A physical-consistency guard failed (e.g. negative average force under penetration).
    #[error("invalid trial '{trial_id}': {reason}")]
    InvalidTrial { trial_id: String, reason: String },

    /// The trial identifier does not match `L<d>T<d>F<digits>`.
    #[error("malformed trial identifier '{0}' (expected L<digit>T<digit>F<number>)")]
    MalformedIdentifier(String),

    /// An auxiliary feature file lacks identity or value columns.
    #[error("malformed feature file {path}: {reason}")]
    MalformedFeatureFile { path: PathBuf, reason: String },

    /// A trial ID appears more than once in a single aggregate snapshot.
    #[error("trial ID '{0}' occurs more than once in one dataset")]
    DuplicateTrialId(String),

    #[error("series '{name}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{name} index {index} is out of range for a curve of {len} samples")]
    IndexOutOfRange {
        name: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
