//! Steps of the ticket sales forecasting pipeline.
//!
//! - `unload` - exports warehouse query results to object storage and waits for the job
//! - `preprocess` - turns the raw export into train/test CSV files
//! - `train` - fits and saves the random forest regressor
//!
//! Each step runs on its own; the pipeline orchestrator wires them together.

pub mod logging;
pub mod preprocess;
pub mod train;
pub mod unload;

pub use preprocess::PreprocessConfig;
pub use train::{load_model, FittedModel, TrainConfig};
pub use unload::{handle_event, TriggerConfig, UnloadTrigger};
