//! Partitioned UNLOAD trigger.
//!
//! Submits an `unload (...) TO ... partition by (...)` statement through the warehouse's
//! data API and polls the statement until it settles.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod trigger;

pub use client::{DataApiClient, ExecuteStatementRequest, StatementDescription, StatementStatus};
pub use config::{PollMode, TriggerConfig};
pub use error::{Error, Result};
pub use event::{handle_event, UnloadEvent, UnloadResponse};
pub use http::HttpDataApiClient;
pub use trigger::{UnloadRequest, UnloadTrigger};
