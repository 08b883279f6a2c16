// src/main.rs

use std::collections::VecDeque;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use force_trial_analysis::axis_names::{AggregateAxis, AggregateField, ContinuousField, PlotAxis};
use force_trial_analysis::config::{AnalysisConfig, OutputFormat};
use force_trial_analysis::constants::DEFAULT_SMOOTHING_WINDOW;
use force_trial_analysis::crate_version;
use force_trial_analysis::data_analysis::aggregate_store::AggregateStore;
use force_trial_analysis::data_analysis::batch::load_directory;
use force_trial_analysis::data_input::feature_file::FeatureDictionary;
use force_trial_analysis::export::write_aggregate_csv;
use force_trial_analysis::plot_functions::plot_aggregate::plot_aggregate;
use force_trial_analysis::plot_functions::plot_comparison::plot_comparison;
use force_trial_analysis::plot_functions::plot_continuous::plot_continuous;
use force_trial_analysis::session::{
    batch_actions, combine_stores, Datasets, Effect, MenuAction, PlotMode, PlotSession,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Continuous,
    Aggregate,
    Comparison,
}

impl From<ModeArg> for PlotMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Continuous => PlotMode::Continuous,
            ModeArg::Aggregate => PlotMode::Aggregate,
            ModeArg::Comparison => PlotMode::Comparison,
        }
    }
}

/// Stick-slip feature extraction and plotting for force-sensor trials.
#[derive(Debug, Parser)]
#[command(name = "force_trial_analysis", version = crate_version(), about)]
struct Cli {
    /// Directory of trial CSV files.
    input: PathBuf,

    /// Second directory of trials. Same protocol: concatenated. Other protocol: compared by trial ID.
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Feature CSV files providing tags and per-trial values.
    #[arg(long = "features", num_args = 1..)]
    features: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Aggregate)]
    mode: ModeArg,

    /// X axis label (e.g. "flag", "Average Force", "position", or a feature name).
    #[arg(long)]
    x: Option<String>,

    #[arg(long)]
    y: Option<String>,

    /// Highlight trials carrying this tag (continuous and aggregate plots).
    #[arg(long)]
    highlight: Option<String>,

    /// Restrict plots to these trial filenames (comma separated).
    #[arg(long, value_delimiter = ',')]
    trials: Vec<String>,

    #[arg(long, default_value = "png")]
    format: OutputFormat,

    #[arg(long, default_value = "figures")]
    output_dir: PathBuf,

    /// Write the aggregate columns to this CSV file.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    smoothing_window: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn default_axes(mode: PlotMode) -> (PlotAxis, PlotAxis) {
    match mode {
        PlotMode::Continuous => (
            PlotAxis::Continuous(ContinuousField::Position),
            PlotAxis::Continuous(ContinuousField::Force),
        ),
        PlotMode::Aggregate => (
            PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::FlagNumber)),
            PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::AvgStiffness)),
        ),
        PlotMode::Comparison => (
            PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::AvgForce)),
            PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::AvgForce)),
        ),
    }
}

fn parse_axis(mode: PlotMode, label: &str, features: &FeatureDictionary) -> Result<PlotAxis, String> {
    match mode {
        PlotMode::Continuous => label.parse::<ContinuousField>().map(PlotAxis::Continuous),
        PlotMode::Aggregate if features.has_feature(label) => {
            Ok(PlotAxis::Aggregate(AggregateAxis::Feature(label.to_string())))
        }
        PlotMode::Aggregate | PlotMode::Comparison => label
            .parse::<AggregateField>()
            .map(|f| PlotAxis::Aggregate(AggregateAxis::Field(f))),
    }
}

fn render(
    datasets: &Datasets,
    session: &PlotSession,
    features: &FeatureDictionary,
    config: &AnalysisConfig,
    output_path: &Path,
) -> Result<bool, Box<dyn Error>> {
    let (x, y) = session.axes().ok_or("no axes selected")?;
    match (datasets, x, y) {
        (Datasets::Single(store), PlotAxis::Continuous(x), PlotAxis::Continuous(y)) => {
            plot_continuous(store, *x, *y, features, session.highlight(), config, output_path)
        }
        (Datasets::Single(store), PlotAxis::Aggregate(x), PlotAxis::Aggregate(y)) => plot_aggregate(
            store.snapshot(),
            store.mode(),
            x,
            y,
            features,
            session.highlight(),
            config,
            output_path,
        ),
        (
            Datasets::Comparison { penetration, shear },
            PlotAxis::Aggregate(AggregateAxis::Field(x)),
            PlotAxis::Aggregate(AggregateAxis::Field(y)),
        ) => plot_comparison(penetration.snapshot(), shear.snapshot(), *x, *y, config, output_path),
        _ => Err(format!("cannot draw {x} vs {y} for the loaded datasets").into()),
    }
}

fn apply_selection(datasets: &mut Datasets, filenames: &[String]) {
    match datasets {
        Datasets::Single(store) => {
            if filenames.is_empty() {
                store.activate_all();
            } else {
                store.set_active(filenames.iter().cloned());
            }
            let snapshot = store.reaggregate();
            println!("Re-aggregated {} active trials.", snapshot.len());
        }
        Datasets::Comparison { .. } => debug!("comparison datasets keep every trial"),
    }
}

fn export(datasets: &Datasets, path: &Path) -> Result<(), Box<dyn Error>> {
    match datasets {
        Datasets::Single(store) => write_aggregate_csv(store.snapshot(), path)?,
        Datasets::Comparison { penetration, shear } => {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let with_suffix = |suffix: &str| path.with_file_name(format!("{stem}_{suffix}.csv"));
            write_aggregate_csv(penetration.snapshot(), &with_suffix("penetration"))?;
            write_aggregate_csv(shear.snapshot(), &with_suffix("shear"))?;
        }
    }
    Ok(())
}

fn load_store(dir: &Path, config: &AnalysisConfig) -> Result<AggregateStore, Box<dyn Error>> {
    println!("\n--- Loading trials from '{}' ---", dir.display());
    let collection = load_directory(dir, config)?;
    if collection.is_empty() {
        return Err(format!("no usable trials found in '{}'", dir.display()).into());
    }
    Ok(AggregateStore::new(collection))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    println!("force_trial_analysis {}", crate_version());

    let config = AnalysisConfig {
        smoothing_window: cli.smoothing_window,
        output_format: cli.format,
        output_dir: cli.output_dir.clone(),
    };

    let primary = load_store(&cli.input, &config)?;
    let mut datasets = match &cli.compare {
        Some(dir) => combine_stores(primary, load_store(dir, &config)?),
        None => Datasets::Single(primary),
    };

    let mut features = FeatureDictionary::new();
    for path in &cli.features {
        features.ingest_file(path);
    }

    let requested: PlotMode = cli.mode.into();
    let mode = match (&datasets, requested) {
        (Datasets::Comparison { .. }, _) => PlotMode::Comparison,
        (Datasets::Single(_), PlotMode::Comparison) => {
            return Err("comparison plots need --compare with a directory of the other protocol".into())
        }
        (Datasets::Single(_), mode) => mode,
    };

    let (default_x, default_y) = default_axes(mode);
    let x = match &cli.x {
        Some(label) => parse_axis(mode, label, &features)?,
        None => default_x,
    };
    let y = match &cli.y {
        Some(label) => parse_axis(mode, label, &features)?,
        None => default_y,
    };

    let mut actions: VecDeque<MenuAction> = batch_actions(mode, &cli.trials, cli.highlight.as_deref()).into();

    let mut session = PlotSession::new();
    session.select_mode(mode)?;
    println!("\n--- Plotting ({mode}) ---");
    let mut effect = session.select_axes(x, y)?;
    loop {
        match effect {
            // Batch runs draw on save only.
            Effect::NeedsRender => session.rendered()?,
            Effect::NeedsReaggregate(filenames) => {
                apply_selection(&mut datasets, &filenames);
                session.rendered()?;
            }
            Effect::Save(stem) => {
                render(&datasets, &session, &features, &config, &config.plot_path(&stem))?;
            }
            Effect::Quit => break,
        }
        let Some(action) = actions.pop_front() else {
            break;
        };
        effect = session.apply(action)?;
    }

    if let Some(path) = &cli.export_csv {
        export(&datasets, path)?;
    }
    Ok(())
}
