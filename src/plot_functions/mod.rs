// src/plot_functions/mod.rs

pub mod plot_aggregate;
pub mod plot_comparison;
pub mod plot_continuous;

// src/plot_functions/mod.rs
