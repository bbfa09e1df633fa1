//! Random forest training step.
//!
//! Steps
//! 1. Load the train and test CSV files
//! 2. Split features and target
//! 3. Fit a random forest regressor
//! 4. Evaluate MSE on the test set
//! 5. Save the fitted model as `model.joblib`

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics;
use tracing::info;

pub const MODEL_FILE_NAME: &str = "model.joblib";
pub const TARGET_COLUMN: &str = "total_sold";

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Unbounded when `None`.
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 0,
        }
    }
}

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub train_path: PathBuf,
    pub train_file: String,
    pub test_path: PathBuf,
    pub test_file: String,
    pub output_path: PathBuf,
    pub target: String,
    pub forest: ForestParams,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("/opt/ml/input/data/train/"),
            train_file: String::from("train.csv"),
            test_path: PathBuf::from("/opt/ml/input/data/test/"),
            test_file: String::from("test.csv"),
            output_path: PathBuf::from("/opt/ml/model/"),
            target: String::from(TARGET_COLUMN),
            forest: ForestParams::default(),
        }
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub mse: f64,
    pub model_path: PathBuf,
}

/// A fitted forest together with the columns it was trained on.
#[derive(Serialize, Deserialize)]
pub struct FittedModel {
    feature_names: Vec<String>,
    target: String,
    forest: Forest,
}

impl FittedModel {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Predicts one value per row, reading the training feature columns from `df`.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let features = df
            .select(&self.feature_names)
            .context("Input is missing feature columns")?;
        self.predict_rows(&feature_rows(&features)?)
    }

    /// Predicts one value per row of raw feature values.
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = rows.iter().find(|row| row.len() != self.feature_names.len()) {
            bail!(
                "Expected {} features per row, got {}",
                self.feature_names.len(),
                row.len()
            );
        }
        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        self.forest
            .predict(&x)
            .map_err(|err| anyhow!("Prediction failed: {err}"))
    }

    /// Writes the model as a single bincode blob.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .context("Failed to serialize model")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write model: {path:?}"))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read model: {path:?}"))?;
        let (model, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .context("Failed to deserialize model")?;
        Ok(model)
    }
}

/// Loads the model saved under `model_dir`, as used by the serving container.
pub fn load_model(model_dir: &Path) -> Result<FittedModel> {
    FittedModel::load(&model_dir.join(MODEL_FILE_NAME))
}

/// Runs the whole training step and prints the test MSE.
pub fn run(config: &TrainConfig) -> Result<TrainReport> {
    info!("Loading the files ...");
    let train = load_csv_file(&config.train_path.join(&config.train_file))?;
    let test = load_csv_file(&config.test_path.join(&config.test_file))?;

    let (x_train, y_train) = split_features_and_target(&train, &config.target)?;
    let (x_test, y_test) = split_features_and_target(&test, &config.target)?;

    info!("Training the model ...");
    let model = train_random_forest(&x_train, &y_train, &config.target, &config.forest)?;

    info!("Evaluating performances ...");
    let predictions = model.predict(&x_test)?;
    let mse = mean_squared_error(&y_test, &predictions)?;
    println!("MSE: {mse}");

    info!("Saving the model ...");
    let model_path = config.output_path.join(MODEL_FILE_NAME);
    model.save(&model_path)?;

    Ok(TrainReport { mse, model_path })
}

pub fn load_csv_file(file_path: &Path) -> Result<DataFrame> {
    let df = CsvReader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {file_path:?}"))?
        .finish()
        .with_context(|| format!("Failed to parse CSV: {file_path:?}"))?;

    info!("Loaded {} rows and {} columns", df.height(), df.width());

    Ok(df)
}

/// Separates `target` from every other column.
pub fn split_features_and_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Vec<f64>)> {
    let features = df.drop(target)?;

    let target = df.column(target)?.cast(&DataType::Float64)?;
    let target = target
        .f64()?
        .into_iter()
        .map(|value| value.context("Missing target value"))
        .collect::<Result<Vec<f64>>>()?;

    Ok((features, target))
}

/// Fits a random forest regressor on `x_train`/`y_train`.
pub fn train_random_forest(
    x_train: &DataFrame,
    y_train: &[f64],
    target: &str,
    params: &ForestParams,
) -> Result<FittedModel> {
    if x_train.width() == 0 {
        bail!("Training set has no feature columns");
    }
    if x_train.height() == 0 {
        bail!("Training set is empty");
    }
    if x_train.height() != y_train.len() {
        bail!(
            "Feature rows ({}) and target rows ({}) differ",
            x_train.height(),
            y_train.len()
        );
    }

    let rows = feature_rows(x_train)?;
    let x = DenseMatrix::from_2d_vec(&rows);
    let y = y_train.to_vec();

    let mut parameters = RandomForestRegressorParameters::default()
        .with_n_trees(params.n_trees)
        .with_min_samples_split(params.min_samples_split)
        .with_min_samples_leaf(params.min_samples_leaf)
        .with_m(x_train.width())
        .with_seed(params.seed);
    if let Some(depth) = params.max_depth {
        parameters = parameters.with_max_depth(depth);
    }

    let forest: Forest = RandomForestRegressor::fit(&x, &y, parameters)
        .map_err(|err| anyhow!("Random forest training failed: {err}"))?;

    Ok(FittedModel {
        feature_names: x_train
            .get_column_names()
            .into_iter()
            .map(String::from)
            .collect(),
        target: target.to_string(),
        forest,
    })
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        bail!(
            "Cannot score {} predictions against {} targets",
            y_pred.len(),
            y_true.len()
        );
    }
    Ok(metrics::mean_squared_error(&y_true.to_vec(), &y_pred.to_vec()))
}

// Transform Polars DataFrame into row-major feature vectors
fn feature_rows(df: &DataFrame) -> Result<Vec<Vec<f64>>> {
    let mut rows = vec![Vec::with_capacity(df.width()); df.height()];
    for series in df.get_columns() {
        let values = series.cast(&DataType::Float64)?;
        for (row, value) in rows.iter_mut().zip(values.f64()?.into_iter()) {
            row.push(value.with_context(|| {
                format!("Missing or non-numeric value in column {}", series.name())
            })?);
        }
    }
    Ok(rows)
}
