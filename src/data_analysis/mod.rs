// src/data_analysis/mod.rs

pub mod aggregate_store;
pub mod batch;
pub mod cross_protocol;
pub mod cycle_segmenter;
pub mod derivative;
pub mod feature_extractor;
pub mod smoothing;
pub mod trial_record;

// src/data_analysis/mod.rs
