// src/export.rs

use std::path::Path;

use csv::Writer;

use crate::constants::EXPORT_HEADERS;
use crate::data_analysis::aggregate_store::AggregateSnapshot;
use crate::error::AnalysisResult;

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one row per trial of the snapshot. NaN means are written as `NaN`
/// and missing drop values as empty cells.
pub fn write_aggregate_csv(snapshot: &AggregateSnapshot, path: &Path) -> AnalysisResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = Writer::from_path(path)?;
    writer.write_record(EXPORT_HEADERS)?;

    for i in 0..snapshot.len() {
        writer.write_record([
            snapshot.filenames[i].clone(),
            snapshot.trial_ids[i].clone(),
            snapshot.numeric_tags[i].to_string(),
            snapshot.locations[i].to_string(),
            snapshot.transects[i].to_string(),
            snapshot.flag_nums[i].to_string(),
            snapshot.avg_force[i].to_string(),
            snapshot.avg_stiffness[i].to_string(),
            snapshot.avg_stick_slip[i].to_string(),
            snapshot.avg_yield[i].to_string(),
            opt(snapshot.drops[i]),
            opt(snapshot.drop_slopes[i]),
            opt(snapshot.deformations[i]),
            snapshot.regression_stiffness[i].to_string(),
        ])?;
    }
    writer.flush()?;
    println!("Aggregate data saved as '{}'.", path.display());
    Ok(())
}
