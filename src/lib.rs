// src/lib.rs - Library interface for the analysis core and presentation adapters

pub mod axis_names;
pub mod config;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod export;
pub mod plot_framework;
pub mod plot_functions;
pub mod session;
pub mod types;

// Git semver when the build environment provides one, else the package version.
pub fn crate_version() -> &'static str {
    option_env!("VERGEN_GIT_SEMVER").unwrap_or(env!("CARGO_PKG_VERSION"))
}
