// src/data_analysis/trial_record.rs

use tracing::warn;

use crate::data_analysis::feature_extractor::{extract_features, TrialFeatures};
use crate::data_input::trial_data::{AcquisitionMode, TrialData};
use crate::data_input::trial_id::TrialId;
use crate::error::AnalysisResult;
use crate::types::Series;

/// Identity, trimmed series and derived features of one processed trial.
/// Never modified once built.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub trial_id: TrialId,
    pub filename: String,
    pub mode: AcquisitionMode,
    pub force: Series,
    pub pos: Series,
    pub time: Series,
    pub velocity: Option<Series>,
    pub avg_force: f64,
    pub stiffness: Vec<f64>,
    pub stick_slip: Vec<f64>,
    pub average_yield: f64,
    pub max_drop: Option<f64>,
    pub max_drop_slope: Option<f64>,
    pub max_drop_deformation: Option<f64>,
    pub regression_stiffness: Option<f64>,
}

impl TrialRecord {
    /// Assembles a record from a trial and its already-computed features.
    /// Fails with `MalformedIdentifier` if the trial ID does not parse.
    pub fn build(trial: TrialData, features: TrialFeatures) -> AnalysisResult<Self> {
        let trial_id: TrialId = trial.trial_id.parse()?;
        let drop = features.max_drop;

        Ok(TrialRecord {
            trial_id,
            filename: trial.filename,
            mode: trial.mode,
            force: trial.trimmed_force,
            pos: trial.trimmed_pos,
            time: trial.trimmed_time,
            velocity: trial.velocity,
            avg_force: trial.average_force,
            stiffness: features.cycles.stiffness,
            stick_slip: features.cycles.stick_slip,
            average_yield: features.cycles.average_yield,
            max_drop: drop.map(|d| d.magnitude),
            max_drop_slope: drop.map(|d| d.slope),
            max_drop_deformation: drop.map(|d| d.deformation),
            regression_stiffness: features.regression_stiffness,
        })
    }

    pub fn id(&self) -> &str {
        self.trial_id.as_str()
    }
}

/// Validates a trial, extracts its features and builds the record.
pub fn process_trial(trial: TrialData) -> AnalysisResult<TrialRecord> {
    trial.validate()?;
    let features = extract_features(&trial);
    TrialRecord::build(trial, features)
}

/// Ordered set of processed trials plus the parallel filename index used for selection.
#[derive(Debug, Clone, Default)]
pub struct TrialCollection {
    records: Vec<TrialRecord>,
    filenames: Vec<String>,
}

impl TrialCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record and appends it to both the record sequence and the filename index.
    pub fn push_trial(&mut self, trial: TrialData, features: TrialFeatures) -> AnalysisResult<&TrialRecord> {
        let record = TrialRecord::build(trial, features)?;
        Ok(self.push_record(record))
    }

    pub fn push_record(&mut self, record: TrialRecord) -> &TrialRecord {
        if self.records.iter().any(|r| r.trial_id == record.trial_id) {
            warn!(trial = %record.trial_id, file = %record.filename, "trial ID already present in this dataset");
        }
        self.filenames.push(record.filename.clone());
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Appends every record of `other`, keeping order.
    pub fn extend(&mut self, other: TrialCollection) {
        for record in other.records {
            self.push_record(record);
        }
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Protocol of the collection, taken from its first record.
    pub fn mode(&self) -> Option<AcquisitionMode> {
        self.records.first().map(|r| r.mode)
    }
}
