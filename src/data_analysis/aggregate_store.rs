// src/data_analysis/aggregate_store.rs

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::axis_names::AggregateField;
use crate::data_analysis::feature_extractor::mean;
use crate::data_analysis::trial_record::{TrialCollection, TrialRecord};
use crate::data_input::trial_data::AcquisitionMode;
use crate::types::Column;

/// Column-oriented view over the active trials. Every column has one entry
/// per included trial, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSnapshot {
    pub trial_ids: Vec<String>,
    pub filenames: Vec<String>,
    /// Sequential `0..n-1` in iteration order. Not derived from location/transect/flag.
    pub numeric_tags: Vec<usize>,
    pub locations: Vec<u32>,
    pub transects: Vec<u32>,
    pub flag_nums: Vec<u64>,
    pub avg_force: Vec<f64>,
    pub avg_stiffness: Vec<f64>,
    pub avg_stick_slip: Vec<f64>,
    pub avg_yield: Vec<f64>,
    pub drops: Vec<Option<f64>>,
    pub drop_slopes: Vec<Option<f64>>,
    pub deformations: Vec<Option<f64>>,
    /// Least-squares stiffness per trial; NaN where the fit is undefined.
    pub regression_stiffness: Vec<f64>,
}

impl AggregateSnapshot {
    pub fn len(&self) -> usize {
        self.trial_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trial_ids.is_empty()
    }

    /// Any scalar column as plottable values. NaN and missing entries both come back as `None`.
    pub fn column(&self, field: AggregateField) -> Column {
        fn finite(v: f64) -> Option<f64> {
            Some(v).filter(|v| v.is_finite())
        }
        match field {
            AggregateField::NumericTag => self.numeric_tags.iter().map(|&t| Some(t as f64)).collect(),
            AggregateField::FlagNumber => self.flag_nums.iter().map(|&f| Some(f as f64)).collect(),
            AggregateField::Location => self.locations.iter().map(|&l| Some(f64::from(l))).collect(),
            AggregateField::Transect => self.transects.iter().map(|&t| Some(f64::from(t))).collect(),
            AggregateField::AvgForce => self.avg_force.iter().map(|&v| finite(v)).collect(),
            AggregateField::AvgStiffness => self.avg_stiffness.iter().map(|&v| finite(v)).collect(),
            AggregateField::AvgStickSlip => self.avg_stick_slip.iter().map(|&v| finite(v)).collect(),
            AggregateField::AvgYield => self.avg_yield.iter().map(|&v| finite(v)).collect(),
            AggregateField::MaxDrop => self.drops.iter().map(|v| v.and_then(finite)).collect(),
            AggregateField::DropSlope => self.drop_slopes.iter().map(|v| v.and_then(finite)).collect(),
            AggregateField::Deformation => self.deformations.iter().map(|v| v.and_then(finite)).collect(),
            AggregateField::RegressionStiffness => self.regression_stiffness.iter().map(|&v| finite(v)).collect(),
        }
    }

    fn push(&mut self, tag: usize, record: &TrialRecord) {
        self.trial_ids.push(record.id().to_string());
        self.filenames.push(record.filename.clone());
        self.numeric_tags.push(tag);
        self.locations.push(record.trial_id.location);
        self.transects.push(record.trial_id.transect);
        self.flag_nums.push(record.trial_id.flag_number);
        self.avg_force.push(record.avg_force);
        self.avg_stiffness.push(mean(&record.stiffness));
        self.avg_stick_slip.push(mean(&record.stick_slip));
        self.avg_yield.push(record.average_yield);
        self.drops.push(record.max_drop);
        self.drop_slopes.push(record.max_drop_slope);
        self.deformations.push(record.max_drop_deformation);
        self.regression_stiffness.push(record.regression_stiffness.unwrap_or(f64::NAN));
    }
}

/// Builds a snapshot of the records whose filename is in `active`, keeping
/// record order. Trials with no surviving cycles get NaN stiffness and
/// stick-slip means rather than being dropped.
pub fn aggregate(records: &[TrialRecord], active: &HashSet<String>) -> AggregateSnapshot {
    let mut snapshot = AggregateSnapshot::default();
    for record in records.iter().filter(|r| active.contains(&r.filename)) {
        snapshot.push(snapshot.len(), record);
    }
    snapshot
}

/// Owns one protocol's trials, the active filename selection and the last
/// snapshot computed from them. Changing the selection only marks the
/// snapshot stale; callers refresh it with [`AggregateStore::reaggregate`].
#[derive(Debug, Clone)]
pub struct AggregateStore {
    collection: TrialCollection,
    active: HashSet<String>,
    snapshot: AggregateSnapshot,
    stale: bool,
}

impl AggregateStore {
    /// Wraps a collection with every trial active and a fresh snapshot.
    pub fn new(collection: TrialCollection) -> Self {
        let active: HashSet<String> = collection.filenames().iter().cloned().collect();
        let snapshot = aggregate(collection.records(), &active);
        Self {
            collection,
            active,
            snapshot,
            stale: false,
        }
    }

    /// Replaces the active filename set. Names not present in the collection are ignored.
    pub fn set_active<I, S>(&mut self, filenames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known: HashSet<&str> = self.collection.filenames().iter().map(String::as_str).collect();
        let mut active = HashSet::new();
        for name in filenames {
            let name = name.into();
            if known.contains(name.as_str()) {
                active.insert(name);
            } else {
                warn!(file = %name, "not a loaded trial file, ignoring");
            }
        }
        self.active = active;
        self.stale = true;
    }

    pub fn activate_all(&mut self) {
        self.active = self.collection.filenames().iter().cloned().collect();
        self.stale = true;
    }

    /// Recomputes the snapshot from scratch over the active trials.
    pub fn reaggregate(&mut self) -> &AggregateSnapshot {
        self.snapshot = aggregate(self.collection.records(), &self.active);
        self.stale = false;
        debug!(
            trials = self.snapshot.len(),
            of = self.collection.len(),
            "re-aggregated"
        );
        &self.snapshot
    }

    /// The last computed snapshot, which may be stale.
    pub fn snapshot(&self) -> &AggregateSnapshot {
        &self.snapshot
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_active(&self, filename: &str) -> bool {
        self.active.contains(filename)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Appends trials of the same protocol. New files start active.
    pub fn extend(&mut self, other: TrialCollection) {
        self.active.extend(other.filenames().iter().cloned());
        self.collection.extend(other);
        self.stale = true;
    }

    pub fn mode(&self) -> Option<AcquisitionMode> {
        self.collection.mode()
    }

    pub fn collection(&self) -> &TrialCollection {
        &self.collection
    }

    pub fn records(&self) -> &[TrialRecord] {
        self.collection.records()
    }

    pub fn filenames(&self) -> &[String] {
        self.collection.filenames()
    }

    pub fn into_collection(self) -> TrialCollection {
        self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis_names::AGGREGATE_FIELDS;
    use crate::data_analysis::trial_record::tests::record;
    use approx::assert_relative_eq;

    fn collection(ids: &[(&str, &str)]) -> TrialCollection {
        let mut c = TrialCollection::new();
        for (id, file) in ids {
            c.push_record(record(id, file, AcquisitionMode::Penetration));
        }
        c
    }

    fn all_active(c: &TrialCollection) -> HashSet<String> {
        c.filenames().iter().cloned().collect()
    }

    fn bits(column: &[f64]) -> Vec<u64> {
        column.iter().map(|v| v.to_bits()).collect()
    }

    #[test]
    fn columns_are_index_aligned_and_tags_sequential() {
        let c = collection(&[("L1T1F3", "a.csv"), ("L2T1F9", "b.csv")]);
        let snap = aggregate(c.records(), &all_active(&c));

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.trial_ids, vec!["L1T1F3", "L2T1F9"]);
        assert_eq!(snap.numeric_tags, vec![0, 1]);
        assert_eq!(snap.locations, vec![1, 2]);
        assert_eq!(snap.flag_nums, vec![3, 9]);
        assert_relative_eq!(snap.avg_stiffness[0], 47.5, max_relative = 1e-9);
        assert_relative_eq!(snap.avg_stick_slip[0], 0.2, max_relative = 1e-9);
        assert_relative_eq!(snap.avg_yield[1], 11.0);
        assert_eq!(snap.drops[0], Some(9.0));
    }

    #[test]
    fn filtering_preserves_order_and_renumbers_tags() {
        let c = collection(&[("L1T1F1", "a.csv"), ("L1T1F2", "b.csv"), ("L1T1F3", "c.csv")]);
        let active: HashSet<String> = ["c.csv", "a.csv"].iter().map(|s| s.to_string()).collect();
        let snap = aggregate(c.records(), &active);
        assert_eq!(snap.filenames, vec!["a.csv", "c.csv"]);
        assert_eq!(snap.numeric_tags, vec![0, 1]);
    }

    #[test]
    fn empty_input_gives_empty_columns() {
        let snap = aggregate(&[], &HashSet::new());
        assert!(snap.is_empty());
        assert!(snap.avg_force.is_empty());
        assert!(snap.column(AggregateField::AvgYield).is_empty());
    }

    #[test]
    fn trial_without_cycles_has_nan_means() {
        let mut r = record("L1T1F1", "a.csv", AcquisitionMode::Shear);
        r.stiffness.clear();
        r.stick_slip.clear();
        let active: HashSet<String> = ["a.csv".to_string()].into_iter().collect();
        let snap = aggregate(&[r], &active);
        assert!(snap.avg_stiffness[0].is_nan());
        assert!(snap.avg_stick_slip[0].is_nan());
        assert_eq!(snap.column(AggregateField::AvgStiffness), vec![None]);
        // fixture curve fits over samples 0..1, which has no spread
        assert!(snap.regression_stiffness[0].is_nan());
        assert_eq!(snap.column(AggregateField::RegressionStiffness), vec![None]);
    }

    #[test]
    fn reaggregate_is_idempotent() {
        let mut c = collection(&[("L1T1F1", "a.csv")]);
        let mut cycleless = record("L1T1F2", "b.csv", AcquisitionMode::Penetration);
        cycleless.stiffness.clear();
        cycleless.stick_slip.clear();
        c.push_record(cycleless);
        let mut store = AggregateStore::new(c);
        let first = store.reaggregate().clone();
        let second = store.reaggregate().clone();
        assert!(first.avg_stiffness[1].is_nan());
        assert_eq!(first.trial_ids, second.trial_ids);
        assert_eq!(first.filenames, second.filenames);
        assert_eq!(first.numeric_tags, second.numeric_tags);
        assert_eq!(first.locations, second.locations);
        assert_eq!(first.transects, second.transects);
        assert_eq!(first.flag_nums, second.flag_nums);
        assert_eq!(first.drops, second.drops);
        assert_eq!(first.drop_slopes, second.drop_slopes);
        assert_eq!(first.deformations, second.deformations);
        // NaN never compares equal, so float columns are compared bitwise
        for (a, b) in [
            (&first.avg_force, &second.avg_force),
            (&first.avg_stiffness, &second.avg_stiffness),
            (&first.avg_stick_slip, &second.avg_stick_slip),
            (&first.avg_yield, &second.avg_yield),
            (&first.regression_stiffness, &second.regression_stiffness),
        ] {
            assert_eq!(bits(a), bits(b));
        }
        for field in AGGREGATE_FIELDS {
            assert_eq!(first.column(field), second.column(field));
        }
    }

    #[test]
    fn selection_marks_stale_until_reaggregated() {
        let mut store = AggregateStore::new(collection(&[("L1T1F1", "a.csv"), ("L1T1F2", "b.csv")]));
        assert!(!store.is_stale());

        store.set_active(["b.csv", "missing.csv"]);
        assert!(store.is_stale());
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.active_count(), 1);

        let snap = store.reaggregate();
        assert_eq!(snap.trial_ids, vec!["L1T1F2"]);
        assert!(!store.is_stale());

        store.activate_all();
        assert_eq!(store.reaggregate().len(), 2);
    }

    #[test]
    fn extend_appends_and_activates_new_files() {
        let mut store = AggregateStore::new(collection(&[("L1T1F1", "a.csv")]));
        store.extend(collection(&[("L1T1F2", "b.csv")]));
        assert!(store.is_stale());
        assert!(store.is_active("b.csv"));
        assert_eq!(store.reaggregate().numeric_tags, vec![0, 1]);
        assert_eq!(store.filenames(), &["a.csv".to_string(), "b.csv".to_string()]);
    }
}
