//! Training script and entry point
//! Steps
//! 1. Load train and test CSV files
//! 2. Split into features and target
//! 3. Train the random forest
//! 4. Print the test MSE
//! 5. Save the model next to the other training artifacts

use std::path::PathBuf;

use clap::Parser;
use sales_forecast_pipeline::logging;
use sales_forecast_pipeline::train::{self, ForestParams, TrainConfig, TARGET_COLUMN};

#[derive(Parser, Debug)]
#[command(about = "Fit the sales random forest and save it as model.joblib")]
struct Args {
    #[arg(long = "train_path", default_value = "/opt/ml/input/data/train/")]
    train_path: PathBuf,

    #[arg(long = "train_file", default_value = "train.csv")]
    train_file: String,

    #[arg(long = "test_path", default_value = "/opt/ml/input/data/test/")]
    test_path: PathBuf,

    #[arg(long = "test_file", default_value = "test.csv")]
    test_file: String,

    /// Directory receiving model.joblib
    #[arg(long = "output_path", default_value = "/opt/ml/model/")]
    output_path: PathBuf,

    /// Number of trees
    #[arg(long = "n_trees", default_value = "100")]
    n_trees: usize,

    /// Max tree depth, unbounded when omitted
    #[arg(long = "max_depth")]
    max_depth: Option<u16>,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    logging::init("sales_forecast_pipeline=info,train=info");

    let args = Args::parse();
    let config = TrainConfig {
        train_path: args.train_path,
        train_file: args.train_file,
        test_path: args.test_path,
        test_file: args.test_file,
        output_path: args.output_path,
        target: String::from(TARGET_COLUMN),
        forest: ForestParams {
            n_trees: args.n_trees,
            max_depth: args.max_depth,
            seed: args.seed,
            ..ForestParams::default()
        },
    };

    let report = train::run(&config)?;
    tracing::info!("Model saved to {:?}", report.model_path);

    Ok(())
}
