//! Preprocessing step: raw warehouse export to train/test CSV files.

use std::path::PathBuf;

use clap::Parser;
use sales_forecast_pipeline::preprocess::{self, PreprocessConfig, DEFAULT_COLUMN_NAMES};
use sales_forecast_pipeline::logging;

#[derive(Parser, Debug)]
#[command(about = "Engineer features and split the raw export into train/test sets")]
struct Args {
    /// Directory holding the raw headerless CSV files
    #[arg(long = "input_path", default_value = "/opt/ml/processing/input/data/")]
    input_path: PathBuf,

    /// Directory receiving train/train.csv and test/test.csv
    #[arg(long = "output_path", default_value = "/opt/ml/processing/output/")]
    output_path: PathBuf,

    /// Comma separated names of the raw columns
    #[arg(long = "column_names", default_value = DEFAULT_COLUMN_NAMES)]
    column_names: String,

    /// Fraction of rows sent to the test set
    #[arg(long = "test_size", default_value = "0.2")]
    test_size: f64,

    /// Seed for the split shuffle
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Args> for PreprocessConfig {
    fn from(args: Args) -> Self {
        Self {
            input_path: args.input_path,
            output_path: args.output_path,
            column_names: preprocess::parse_column_names(&args.column_names),
            test_size: args.test_size,
            seed: args.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("sales_forecast_pipeline=info,preprocess=info");

    let config = PreprocessConfig::from(Args::parse());
    preprocess::run(&config)
}
