// src/config.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::DEFAULT_SMOOTHING_WINDOW;

/// Image format produced by the presentation adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unsupported output format '{other}' (expected png or svg)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Runtime options shared by the loader and the renderers.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Moving-average window applied before extremum detection.
    pub smoothing_window: usize,
    pub output_format: OutputFormat,
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            output_format: OutputFormat::default(),
            output_dir: PathBuf::from("figures"),
        }
    }
}

impl AnalysisConfig {
    /// Full path for a plot named `stem`, with the configured extension.
    pub fn plot_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", stem, self.output_format.extension()))
    }
}
