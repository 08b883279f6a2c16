// src/data_input/mod.rs

pub mod feature_file;
pub mod trial_data;
pub mod trial_id;
pub mod trial_parser;

// src/data_input/mod.rs
