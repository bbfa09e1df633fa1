//! Raw export preprocessing.
//!
//! Steps
//! 1. Load every file of the input directory as a headerless CSV
//! 2. Derive `day_of_week`, recode `holiday`, drop unused columns
//! 3. Random train/test split
//! 4. Write `train/train.csv` and `test/test.csv`

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

pub const DEFAULT_COLUMN_NAMES: &str = "total_sold,total_paid,venueid,catid,caldate,holiday";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings for one preprocessing run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub column_names: Vec<String>,
    /// Fraction of rows sent to the test split.
    pub test_size: f64,
    /// Seed for the split shuffle, entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("/opt/ml/processing/input/data/"),
            output_path: PathBuf::from("/opt/ml/processing/output/"),
            column_names: parse_column_names(DEFAULT_COLUMN_NAMES),
            test_size: 0.2,
            seed: None,
        }
    }
}

/// Splits a comma separated column list.
pub fn parse_column_names(names: &str) -> Vec<String> {
    names.split(',').map(|name| name.trim().to_string()).collect()
}

/// Runs the whole preprocessing step.
pub fn run(config: &PreprocessConfig) -> Result<()> {
    info!("Loading the dataframe ...");
    let df = load_input_dir(&config.input_path, &config.column_names)?;

    info!("Preprocessing ...");
    let df = engineer_features(df)?;

    info!("Splitting ...");
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (mut train, mut test) = train_test_split(&df, config.test_size, &mut rng)?;
    info!("{} train rows, {} test rows", train.height(), test.height());

    info!("Saving ...");
    write_csv_file(&mut train, &config.output_path.join("train").join("train.csv"))?;
    write_csv_file(&mut test, &config.output_path.join("test").join("test.csv"))?;

    Ok(())
}

/// Reads all files of `dir` as headerless CSVs named by `column_names` and stacks them.
///
/// Every value is kept as text. The first row of the stacked frame is dropped: the
/// warehouse export writes its header line there.
pub fn load_input_dir(dir: &Path, column_names: &[String]) -> Result<DataFrame> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {dir:?}"))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    info!("{files:?}");

    let mut stacked: Option<DataFrame> = None;
    for file in &files {
        let df = load_headerless_csv(file, column_names)?;
        stacked = Some(match stacked {
            Some(acc) => acc.vstack(&df)?,
            None => df,
        });
    }

    let Some(df) = stacked else {
        bail!("No input files found in {dir:?}");
    };

    Ok(df.slice(1, df.height().saturating_sub(1)))
}

fn load_headerless_csv(path: &Path, column_names: &[String]) -> Result<DataFrame> {
    let mut df = CsvReader::from_path(path)
        .with_context(|| format!("Failed to open file: {path:?}"))?
        .has_header(false)
        .infer_schema(Some(0))
        .finish()
        .with_context(|| format!("Failed to parse CSV: {path:?}"))?;
    df.set_column_names(column_names)
        .with_context(|| format!("Unexpected column count in {path:?}"))?;
    Ok(df)
}

/// Adds `day_of_week`, recodes `holiday` to 0/1 and drops `total_paid` and `caldate`.
pub fn engineer_features(mut df: DataFrame) -> Result<DataFrame> {
    let days = df
        .column("caldate")?
        .utf8()?
        .into_iter()
        .map(|value| {
            let value = value.context("Missing caldate value")?;
            day_of_week(value)
        })
        .collect::<Result<Vec<i32>>>()?;

    let holiday: Vec<i32> = df
        .column("holiday")?
        .utf8()?
        .into_iter()
        .map(|value| i32::from(value == Some("True")))
        .collect();

    df.with_column(Series::new("day_of_week", days))?;
    df.with_column(Series::new("holiday", holiday))?;

    let df = df.drop("total_paid")?.drop("caldate")?;
    Ok(df)
}

/// Weekday of a `YYYY-MM-DD` date, Monday being 0.
pub fn day_of_week(date: &str) -> Result<i32> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .with_context(|| format!("Invalid date: {date:?}"))?;
    Ok(date.weekday().num_days_from_monday() as i32)
}

/// Shuffles the rows of `df` and splits them into (train, test).
///
/// The test split receives `ceil(height * test_size)` rows. Fails when either split
/// would end up empty.
pub fn train_test_split<R: Rng + ?Sized>(
    df: &DataFrame,
    test_size: f64,
    rng: &mut R,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        bail!("test_size must be between 0 and 1, got {test_size}");
    }

    // generate vector from 0 to # of rows in df
    let mut indices: Vec<u32> = (0..df.height() as u32).collect();
    indices.shuffle(rng);

    let test_len = (df.height() as f64 * test_size).ceil() as usize;
    if test_len == 0 || test_len >= df.height() {
        bail!(
            "Cannot split {} rows with test_size {test_size}: one split would be empty",
            df.height()
        );
    }
    let (test_indices, train_indices) = indices.split_at(test_len);

    let train_indices_ca = UInt32Chunked::from_vec("", train_indices.to_vec());
    let test_indices_ca = UInt32Chunked::from_vec("", test_indices.to_vec());

    let train_df = df.take(&train_indices_ca)?;
    let test_df = df.take(&test_indices_ca)?;

    Ok((train_df, test_df))
}

/// Writes `df` with a header row and no index column, creating parent directories.
pub fn write_csv_file(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {parent:?}"))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file: {path:?}"))?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}
