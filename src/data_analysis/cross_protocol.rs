// src/data_analysis/cross_protocol.rs

use std::collections::{BTreeSet, HashMap};

use crate::axis_names::AggregateField;
use crate::data_analysis::aggregate_store::AggregateSnapshot;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Column;

/// Trial IDs present in both snapshots, in sorted order.
pub fn common_trial_ids(a: &AggregateSnapshot, b: &AggregateSnapshot) -> BTreeSet<String> {
    let in_b: BTreeSet<&str> = b.trial_ids.iter().map(String::as_str).collect();
    a.trial_ids
        .iter()
        .filter(|id| in_b.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Values of one field from each protocol, paired by trial ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedSeries {
    pub ids: Vec<String>,
    pub x: Column,
    pub y: Column,
    /// Numeric tag of each trial in snapshot `a`, used for point coloring.
    pub tags: Vec<usize>,
}

impl PairedSeries {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Pairs where both sides carry a value, with the colour key of each.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.tags)
            .filter_map(|((x, y), &tag)| Some(((*x)?, (*y)?, tag)))
    }
}

// trial ID -> row index; a repeated ID makes the join ambiguous.
fn index_by_id(snapshot: &AggregateSnapshot) -> AnalysisResult<HashMap<&str, usize>> {
    let mut index = HashMap::with_capacity(snapshot.len());
    for (row, id) in snapshot.trial_ids.iter().enumerate() {
        if index.insert(id.as_str(), row).is_some() {
            return Err(AnalysisError::DuplicateTrialId(id.clone()));
        }
    }
    Ok(index)
}

/// Emits `(a[field_a], b[field_b])` for every ID in `ids` present in both
/// snapshots, in the iteration order of `ids`.
pub fn align(
    a: &AggregateSnapshot,
    b: &AggregateSnapshot,
    ids: &BTreeSet<String>,
    field_a: AggregateField,
    field_b: AggregateField,
) -> AnalysisResult<PairedSeries> {
    let index_a = index_by_id(a)?;
    let index_b = index_by_id(b)?;
    let column_a = a.column(field_a);
    let column_b = b.column(field_b);

    let mut paired = PairedSeries::default();
    for id in ids {
        let (Some(&row_a), Some(&row_b)) = (index_a.get(id.as_str()), index_b.get(id.as_str())) else {
            continue;
        };
        paired.ids.push(id.clone());
        paired.x.push(column_a[row_a]);
        paired.y.push(column_b[row_b]);
        paired.tags.push(a.numeric_tags[row_a]);
    }
    Ok(paired)
}
