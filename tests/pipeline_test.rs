// tests/pipeline_test.rs

use std::fs;
use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;

use force_trial_analysis::axis_names::{AggregateAxis, AggregateField, PlotAxis};
use force_trial_analysis::config::AnalysisConfig;
use force_trial_analysis::constants::EXPORT_HEADERS;
use force_trial_analysis::data_analysis::aggregate_store::AggregateStore;
use force_trial_analysis::data_analysis::batch::load_directory;
use force_trial_analysis::data_analysis::cross_protocol::{align, common_trial_ids};
use force_trial_analysis::data_input::feature_file::FeatureDictionary;
use force_trial_analysis::export::write_aggregate_csv;
use force_trial_analysis::session::{batch_actions, combine_stores, Datasets, Effect, PlotMode, PlotSession};

// Sawtooth: force climbs 0..9 over ten samples then snaps back, position advances 0.01 per sample.
fn sawtooth_trial(trial_id: &str, mode: &str, force_offset: f64) -> String {
    let mut body = format!("trial_id,{trial_id}\nmode,{mode}\ntime,position,force\n");
    for i in 0..40 {
        let force = (i % 10) as f64 + force_offset;
        body.push_str(&format!("{},{},{}\n", i as f64 * 0.1, i as f64 * 0.01, force));
    }
    body
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::File::create(dir.join(name))
        .unwrap()
        .write_all(body.as_bytes())
        .unwrap();
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        smoothing_window: 1,
        ..AnalysisConfig::default()
    }
}

fn penetration_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a_pen.csv", &sawtooth_trial("L1T1F1", "penetration", 0.0));
    write(dir.path(), "b_pen.csv", &sawtooth_trial("L1T1F2", "penetration", 1.0));
    // negative average force under penetration is rejected and skipped
    write(dir.path(), "c_pen.csv", &sawtooth_trial("L1T1F3", "penetration", -20.0));
    dir
}

fn shear_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x_shear.csv", &sawtooth_trial("L1T1F2", "shear", 0.0));
    write(dir.path(), "y_shear.csv", &sawtooth_trial("L1T1F4", "shear", 0.0));
    dir
}

#[test]
fn directory_to_snapshot() {
    let dir = penetration_dir();
    let collection = load_directory(dir.path(), &config()).unwrap();
    assert_eq!(collection.len(), 2);

    let store = AggregateStore::new(collection);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.trial_ids, vec!["L1T1F1", "L1T1F2"]);
    assert_eq!(snapshot.filenames, vec!["a_pen.csv", "b_pen.csv"]);
    assert_eq!(snapshot.numeric_tags, vec![0, 1]);
    assert_eq!(snapshot.flag_nums, vec![1, 2]);

    // two cycles per trial, each rising 9 N over 0.09 m
    assert_relative_eq!(snapshot.avg_stiffness[0], 100.0, max_relative = 1e-6);
    assert_relative_eq!(snapshot.avg_stick_slip[0], 0.09, max_relative = 1e-6);
    assert_relative_eq!(snapshot.avg_yield[0], 9.0);
    assert_relative_eq!(snapshot.avg_yield[1], 10.0);
    assert_relative_eq!(snapshot.avg_force[0], 4.5);
    assert_relative_eq!(snapshot.drops[0].unwrap(), 9.0);
    assert_relative_eq!(snapshot.deformations[0].unwrap(), 0.01, max_relative = 1e-6);

    // first maximum (9) precedes first minimum (10): the fit covers samples 0..9 of F = 100 x
    assert_relative_eq!(snapshot.regression_stiffness[0], 100.0, max_relative = 1e-9);
    assert_eq!(
        snapshot.column(AggregateField::RegressionStiffness)[0].map(f64::round),
        Some(100.0)
    );
}

#[test]
fn selection_and_feature_overlays() {
    let dir = penetration_dir();
    let mut store = AggregateStore::new(load_directory(dir.path(), &config()).unwrap());

    write(
        dir.path(),
        "surface.tags",
        "location,transect,flag,tags\n1,1,2,crust\n1,1,9,crust\n",
    );
    write(dir.path(), "moisture.data", "id,data\nL1T1F1,0.31\nL1T1F2,dry\n");
    let mut features = FeatureDictionary::new();
    assert!(features.ingest_file(&dir.path().join("surface.tags")));
    assert!(features.ingest_file(&dir.path().join("moisture.data")));

    let snapshot = store.snapshot().clone();
    assert_eq!(features.highlight_mask(&snapshot, "crust"), vec![false, true]);
    assert_eq!(features.highlight_mask(&snapshot, "unknown"), vec![false, false]);
    assert_eq!(features.match_numeric(&snapshot, "moisture"), vec![Some(0.31), None]);

    store.set_active(["b_pen.csv"]);
    assert!(store.is_stale());
    let filtered = store.reaggregate();
    assert_eq!(filtered.trial_ids, vec!["L1T1F2"]);
    assert_eq!(filtered.numeric_tags, vec![0]);
    assert_eq!(features.highlight_mask(filtered, "crust"), vec![true]);
}

#[test]
fn penetration_and_shear_are_cross_referenced() {
    let pen = penetration_dir();
    let shear = shear_dir();
    let a = AggregateStore::new(load_directory(pen.path(), &config()).unwrap());
    let b = AggregateStore::new(load_directory(shear.path(), &config()).unwrap());

    let Datasets::Comparison { penetration, shear } = combine_stores(b, a) else {
        panic!("expected a comparison");
    };
    let ids = common_trial_ids(penetration.snapshot(), shear.snapshot());
    assert_eq!(ids.iter().map(String::as_str).collect::<Vec<_>>(), vec!["L1T1F2"]);
    assert_eq!(ids, common_trial_ids(shear.snapshot(), penetration.snapshot()));

    let paired = align(
        penetration.snapshot(),
        shear.snapshot(),
        &ids,
        AggregateField::AvgYield,
        AggregateField::AvgYield,
    )
    .unwrap();
    assert_eq!(paired.ids, vec!["L1T1F2"]);
    assert_eq!(paired.x, vec![Some(10.0)]);
    assert_eq!(paired.y, vec![Some(9.0)]);
}

#[test]
fn comparison_run_with_trial_selection_reaches_save() {
    let pen = penetration_dir();
    let shear = shear_dir();
    let a = AggregateStore::new(load_directory(pen.path(), &config()).unwrap());
    let b = AggregateStore::new(load_directory(shear.path(), &config()).unwrap());
    let datasets = combine_stores(a, b);
    assert!(datasets.is_comparison());

    let axis = PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::AvgForce));
    let mut session = PlotSession::new();
    session.select_mode(PlotMode::Comparison).unwrap();
    assert_eq!(session.select_axes(axis.clone(), axis).unwrap(), Effect::NeedsRender);
    session.rendered().unwrap();

    let actions = batch_actions(PlotMode::Comparison, &["a_pen.csv".to_string()], Some("crust"));
    let effects: Vec<Effect> = actions.into_iter().map(|a| session.apply(a).unwrap()).collect();
    assert_eq!(
        effects,
        vec![Effect::Save("Average Force_vs_Average Force".to_string()), Effect::Quit]
    );
}

#[test]
fn same_protocol_directories_are_concatenated() {
    let first = shear_dir();
    let second = tempfile::tempdir().unwrap();
    write(second.path(), "z_shear.csv", &sawtooth_trial("L2T1F1", "shear", 0.0));

    let a = AggregateStore::new(load_directory(first.path(), &config()).unwrap());
    let b = AggregateStore::new(load_directory(second.path(), &config()).unwrap());
    let Datasets::Single(store) = combine_stores(a, b) else {
        panic!("expected a single dataset");
    };
    assert_eq!(store.snapshot().trial_ids, vec!["L1T1F2", "L1T1F4", "L2T1F1"]);
    assert_eq!(store.snapshot().numeric_tags, vec![0, 1, 2]);
}

#[test]
fn snapshot_export() {
    let dir = penetration_dir();
    let store = AggregateStore::new(load_directory(dir.path(), &config()).unwrap());
    let out = dir.path().join("export").join("aggregate.csv");
    write_aggregate_csv(store.snapshot(), &out).unwrap();

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, EXPORT_HEADERS);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][1], "L1T1F2");
}
