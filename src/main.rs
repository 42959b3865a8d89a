//! Churn pipeline CLI.
//!
//! Discrete batch steps invoked sequentially by an operator:
//! `prepare` → `train` → `evaluate`, plus `predict` for single profiles.
//! Each step loads its inputs from the artifact store, fails loudly when a
//! prerequisite step has not run, and persists its own output on success.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use churn_pipeline::config::PipelineConfig;
use churn_pipeline::data::{load_records, CustomerProfile};
use churn_pipeline::metrics;
use churn_pipeline::model::GradientBoostedClassifier;
use churn_pipeline::preprocessing::DataPreparer;
use churn_pipeline::serve::PredictionService;
use churn_pipeline::store::ArtifactStore;

#[derive(Parser, Debug)]
#[command(name = "churn-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer churn prediction pipeline", long_about = None)]
struct Cli {
    /// Optional TOML config file layered over the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepare the data: clip, encode, split, scale, rebalance
    Prepare {
        /// Input CSV table (overrides the configured path)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Train the classifier on the prepared training set
    Train,
    /// Evaluate the trained model on the held-out test set
    Evaluate,
    /// Predict churn for one customer profile (JSON file)
    Predict {
        /// Path to a JSON-encoded customer profile
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let store = ArtifactStore::from_config(&config);

    match cli.command {
        Commands::Prepare { dataset } => run_prepare(&config, &store, dataset),
        Commands::Train => run_train(&store),
        Commands::Evaluate => run_evaluate(&store),
        Commands::Predict { input } => run_predict(&store, &input),
    }
}

fn run_prepare(
    config: &PipelineConfig,
    store: &ArtifactStore,
    dataset: Option<PathBuf>,
) -> Result<()> {
    config.ensure_dirs()?;
    let path = dataset.unwrap_or_else(|| config.dataset_path.clone());
    let records = load_records(&path)?;

    let preparer = DataPreparer::from_config(config);
    let (data, preprocessor) = preparer
        .prepare(&records)
        .context("data preparation failed")?;
    store.save_prepared(&data, &preprocessor)?;

    info!(
        train_rows = data.x_train.nrows(),
        test_rows = data.x_test.nrows(),
        "prepare complete"
    );
    Ok(())
}

fn run_train(store: &ArtifactStore) -> Result<()> {
    let (x_train, y_train) = store.load_training_set()?;

    let model = GradientBoostedClassifier::new()
        .fit(&x_train, &y_train)
        .context("model training failed")?;
    store.save_model(&model)?;

    info!(trees = model.n_trees(), "train complete");
    Ok(())
}

fn run_evaluate(store: &ArtifactStore) -> Result<()> {
    let model = store.load_model()?;
    let (x_test, y_test) = store.load_test_set()?;

    let predictions = model.predict(&x_test)?;
    let evaluation = metrics::evaluate(&predictions, &y_test)?;
    store.save_evaluation(&evaluation)?;

    info!(
        accuracy = evaluation.accuracy,
        precision = evaluation.precision,
        recall = evaluation.recall,
        f1 = evaluation.f1,
        "evaluate complete"
    );
    println!(
        "accuracy {:.4}  precision {:.4}  recall {:.4}  f1 {:.4}",
        evaluation.accuracy, evaluation.precision, evaluation.recall, evaluation.f1
    );
    Ok(())
}

fn run_predict(store: &ArtifactStore, input: &PathBuf) -> Result<()> {
    let service = PredictionService::load(store)?;

    let file = File::open(input)
        .with_context(|| format!("cannot open profile {}", input.display()))?;
    let profile: CustomerProfile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("malformed profile {}", input.display()))?;

    let prediction = service.predict(&profile)?;
    println!(
        "prediction: {} (churn probability {:.4})",
        prediction.label, prediction.probability
    );
    Ok(())
}
