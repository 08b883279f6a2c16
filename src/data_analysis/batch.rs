// src/data_analysis/batch.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::data_analysis::trial_record::{process_trial, TrialCollection};
use crate::data_input::trial_parser::load_trial;
use crate::error::AnalysisResult;

/// Trial files (`*.csv`) directly inside `dir`, sorted by path.
pub fn list_trial_files(dir: &Path) -> AnalysisResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads and processes every trial file in `dir`, one at a time. A trial
/// that fails to parse, validate or build is logged and skipped.
pub fn load_directory(dir: &Path, config: &AnalysisConfig) -> AnalysisResult<TrialCollection> {
    let paths = list_trial_files(dir)?;
    load_files(&paths, config)
}

pub fn load_files(paths: &[PathBuf], config: &AnalysisConfig) -> AnalysisResult<TrialCollection> {
    let mut collection = TrialCollection::new();
    let mut skipped = 0usize;

    for (i, path) in paths.iter().enumerate() {
        println!("Processing file {} of {}: {}", i + 1, paths.len(), path.display());
        let result = load_trial(path, config.smoothing_window).and_then(process_trial);
        match result {
            Ok(record) => {
                collection.push_record(record);
            }
            Err(e) => {
                warn!(file = %path.display(), "skipping trial: {e}");
                skipped += 1;
            }
        }
    }

    info!(
        loaded = collection.len(),
        skipped,
        mode = ?collection.mode(),
        "finished loading trials"
    );
    Ok(collection)
}
