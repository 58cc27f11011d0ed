//! Climcast CLI - per-city climate forecasting and disaster-risk assessment.
//!
//! Loads monthly climate tables, runs the feature pipeline, forecasts
//! future months and classifies each city's disaster risk.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use climcast::classify::{train, DisasterModel, TrainingSet};
use climcast::config::AppConfig;
use climcast::export::{export_forecasts, format_forecast, ExportFormat};
use climcast::features::{FeatureEngine, ForecastMethod};
use climcast::logging;
use climcast::pipeline::{assess_all, assess_city, Pipeline, StageConfig};
use climcast::series::{CityName, VariableKind};
use climcast::store::DataStore;

/// Per-city climate forecasting and disaster-risk assessment.
#[derive(Parser)]
#[command(name = "climcast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory holding temperature.csv, rainfall.csv and sunshine.csv.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ModelArgs {
    /// Load a trained model instead of training one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Training CSV (temperature,rainfall,sunshine,label). Synthetic if omitted.
    #[arg(long)]
    training: Option<PathBuf>,

    /// Random seed for training.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of trees in the ensemble.
    #[arg(long)]
    trees: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast future months for every city.
    Forecast {
        #[command(flatten)]
        data: DataArgs,

        /// Number of months to forecast.
        #[arg(long)]
        horizon: Option<usize>,

        /// Trend model.
        #[arg(short, long)]
        method: Option<MethodArg>,

        /// Polynomial degree (ignored for linear).
        #[arg(long)]
        degree: Option<usize>,

        /// Confidence interval half-width as a multiple of the fit error.
        #[arg(long)]
        ci_multiplier: Option<f64>,

        /// Variables to forecast (comma-separated).
        #[arg(long, value_delimiter = ',')]
        variables: Vec<String>,

        /// Write forecasts to this file (.csv, .tsv, .txt or .json).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format, overriding the file extension.
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Add error and confidence interval columns.
        #[arg(long)]
        uncertainty: bool,
    },

    /// Classify disaster risk for one or all cities.
    Assess {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Only assess this city.
        #[arg(long)]
        city: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Train a classifier and save it as JSON.
    Train {
        #[command(flatten)]
        model: ModelArgs,

        /// Synthetic training samples when no training file is given.
        #[arg(long)]
        samples: Option<usize>,

        /// Output model path.
        #[arg(short, long, default_value = "./model.json")]
        output: PathBuf,
    },

    /// Display information about the loaded data and effective configuration.
    Info {
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Straight-line trend.
    Linear,
    /// Polynomial trend of --degree.
    Polynomial,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Tsv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Tsv => ExportFormat::Tsv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Forecast {
            data,
            horizon,
            method,
            degree,
            ci_multiplier,
            variables,
            output,
            format,
            uncertainty,
        } => {
            data.apply(&mut config);
            let features = &mut config.features;
            if let Some(horizon) = horizon {
                features.horizon = horizon;
            }
            if let Some(method) = method {
                features.method = match method {
                    MethodArg::Linear => "linear".to_string(),
                    MethodArg::Polynomial => "polynomial".to_string(),
                };
            }
            if let Some(degree) = degree {
                features.degree = degree;
            }
            if let Some(k) = ci_multiplier {
                features.ci_multiplier = k;
            }
            if !variables.is_empty() {
                features.forecast_variables = variables.iter().map(|v| VariableKind::parse(v)).collect();
            }
            if let Some(format) = format {
                config.export.format = Some(format.into());
            }
            if uncertainty {
                config.export.include_uncertainty = true;
            }
            run_forecast(&config, output.as_deref())
        }
        Commands::Assess {
            data,
            model,
            city,
            json,
        } => {
            data.apply(&mut config);
            run_assess(&mut config, &model, city.as_deref(), json)
        }
        Commands::Train {
            model,
            samples,
            output,
        } => {
            if let Some(samples) = samples {
                config.classifier.training_samples = samples;
            }
            run_train(&mut config, &model, &output)
        }
        Commands::Info { data } => {
            data.apply(&mut config);
            run_info(&config)
        }
    }
}

impl DataArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.store.data_dir = dir.clone();
        }
    }
}

/// Loads the data and runs the standard feature pipeline.
fn process(config: &AppConfig) -> Result<FeatureEngine, Box<dyn Error>> {
    println!("Loading climate data from {}", config.store.data_dir.display());
    let store = DataStore::new(config.store.clone());
    let table = store.load()?;
    if let Some(report) = store.last_report() {
        println!(
            "  {} cities, {} series, {} malformed rows dropped",
            table.len(),
            report.series_loaded,
            report.malformed.len()
        );
    }

    println!("\nRunning feature pipeline...");
    let mut engine = FeatureEngine::new(&table, config.features.clone());
    let pipeline = Pipeline::standard(StageConfig::with_features(config.features.clone()));
    pipeline.run_with_callbacks(
        &mut engine,
        |name, i, total| {
            println!("  [{}/{}] Starting: {}", i + 1, total, name);
        },
        |name, i, total| {
            println!("  [{}/{}] Completed: {}", i + 1, total, name);
        },
    )?;

    Ok(engine)
}

fn run_forecast(config: &AppConfig, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let method = config.features.forecast_method()?;

    println!("Climcast - Climate Forecast");
    println!("===========================");
    match method {
        ForecastMethod::Linear => println!("Method: linear"),
        ForecastMethod::Polynomial { degree } => println!("Method: polynomial (degree {})", degree),
    }
    println!("Horizon: {} months", config.features.horizon);
    println!("CI multiplier: {}", config.features.ci_multiplier);
    println!();

    let engine = process(config)?;
    let forecasts = engine.forecasts();

    println!("\nForecasts ({}):", forecasts.len());
    for (key, result) in forecasts {
        println!(
            "  {:<20} {:<14} [{}]  error {:.3}",
            key.city.as_str(),
            key.variable.name(),
            format_forecast(&result.forecast),
            result.error
        );
    }

    if let Some(path) = output {
        println!("\nExporting forecasts...");
        let summary = export_forecasts(path, forecasts, &config.export)?;
        println!(
            "  Exported {} rows ({}) to {}",
            summary.rows,
            summary.format.extension(),
            summary.path.display()
        );
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
    Ok(())
}

/// Loads a saved model, or trains one from the configured training data.
fn build_model(config: &mut AppConfig, args: &ModelArgs) -> Result<DisasterModel, Box<dyn Error>> {
    if let Some(path) = &args.model {
        println!("Loading model from {}", path.display());
        return Ok(DisasterModel::load(path)?);
    }

    if let Some(seed) = args.seed {
        config.classifier.seed = seed;
    }
    if let Some(trees) = args.trees {
        config.classifier.n_trees = trees;
    }
    let classifier = &config.classifier;

    let set = match &args.training {
        Some(path) => TrainingSet::from_csv_path(path)?,
        None => TrainingSet::synthetic(classifier.seed, classifier.training_samples),
    };
    println!(
        "Training classifier: {} trees, {} samples, seed {}",
        classifier.n_trees,
        set.len(),
        classifier.seed
    );
    Ok(train(&set, classifier)?)
}

fn run_assess(
    config: &mut AppConfig,
    model_args: &ModelArgs,
    city: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let model = build_model(config, model_args)?;
    let engine = process(config)?;

    if let Some(name) = city {
        let city = CityName::new(name).ok_or("city name is empty")?;
        match assess_city(&engine, &model, &city) {
            Some(assessment) if json => println!("{}", serde_json::to_string_pretty(&assessment)?),
            Some(assessment) => {
                println!("\n{}", assessment.city);
                println!("  Mean temperature: {:.1}", assessment.vector.temperature);
                println!("  Mean rainfall:    {:.1}", assessment.vector.rainfall);
                println!("  Mean sunshine:    {:.1}", assessment.vector.sunshine);
                println!("  Risk:             {}", assessment.label);
                println!("  Recommendation:   {}", assessment.recommendation);
            }
            None => println!("\n{}: incomplete data, no assessment", city),
        }
        return Ok(());
    }

    let report = assess_all(&engine, &model);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nAssessments ({}):", report.assessments.len());
    for a in &report.assessments {
        println!("  {:<20} {:<12} {}", a.city.as_str(), a.label.name(), a.recommendation);
    }
    if !report.skipped.is_empty() {
        println!("\nSkipped (incomplete data): {}", report.skipped.len());
        for city in &report.skipped {
            println!("  {}", city);
        }
    }
    Ok(())
}

fn run_train(config: &mut AppConfig, model_args: &ModelArgs, output: &Path) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let model = build_model(config, model_args)?;
    model.save(output)?;
    println!("Saved {} trees to {}", model.tree_count(), output.display());
    println!("Training completed in {:.2?}", start.elapsed());
    Ok(())
}

fn run_info(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    println!("Climcast - Data and Configuration Info");
    println!("======================================");
    println!();

    let store = DataStore::new(config.store.clone());
    let table = store.load()?;

    println!("Data directory: {}", config.store.data_dir.display());
    println!("Cities: {}", table.len());
    for source in &config.store.sources {
        let complete = table
            .values()
            .filter(|vars| vars.get(&source.variable).is_some_and(|s| s.is_complete()))
            .count();
        println!(
            "  {:<14} {:>6} complete series  ({})",
            source.variable.name(),
            complete,
            source.file.display()
        );
    }
    if let Some(report) = store.last_report() {
        println!("Malformed rows: {}", report.malformed.len());
        for record in &report.malformed {
            println!("  {}", record);
        }
    }

    println!();
    println!("Effective configuration:");
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
