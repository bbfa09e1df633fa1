//! Lambda-style entry point for the unload trigger.

use serde::{Deserialize, Serialize};

use super::client::DataApiClient;
use super::config::TriggerConfig;
use super::error::Result;
use super::trigger::{UnloadRequest, UnloadTrigger};

/// Inputs handed over by the pipeline's lambda step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UnloadEvent {
    pub cluster_id: String,
    pub sql_query: String,
    pub s3_path: String,
    pub redshift_role: String,
    pub partition_by_column: String,
}

impl From<UnloadEvent> for UnloadRequest {
    fn from(event: UnloadEvent) -> Self {
        Self {
            cluster_id: event.cluster_id,
            sql_query: event.sql_query,
            s3_path: event.s3_path,
            role: event.redshift_role,
            partition_by_column: event.partition_by_column,
        }
    }
}

/// Handler output, returned to the pipeline as the step's outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadResponse {
    pub status: bool,
    pub s3_path: String,
}

/// Runs the unload described by `event`.
pub fn handle_event<C: DataApiClient>(
    client: C,
    config: TriggerConfig,
    event: UnloadEvent,
) -> Result<UnloadResponse> {
    let s3_path = event.s3_path.clone();
    let status = UnloadTrigger::new(client, config).run(&event.into())?;
    Ok(UnloadResponse { status, s3_path })
}
