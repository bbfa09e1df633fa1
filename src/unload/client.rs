//! Data API client abstraction.
//!
//! The poll loop only needs two operations from the remote service, so the client is a
//! trait: production code talks HTTP through [`HttpDataApiClient`](super::HttpDataApiClient)
//! and tests substitute a scripted fake.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::Result;

/// Status of a submitted statement as reported by the data API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    Submitted,
    Picked,
    Started,
    Running,
    Finished,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl StatementStatus {
    /// FINISHED and FAILED end a statement's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Picked => "PICKED",
            Self::Started => "STARTED",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an `ExecuteStatement` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteStatementRequest {
    pub cluster_identifier: String,
    pub database: String,
    pub db_user: String,
    pub sql: String,
}

/// Relevant part of a `DescribeStatement` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementDescription {
    pub status: StatementStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// The two data API operations the unload trigger depends on.
pub trait DataApiClient {
    /// Submits a statement and returns its execution id.
    fn execute_statement(&self, request: &ExecuteStatementRequest) -> Result<String>;

    /// Fetches the current status (and error detail, if any) of a statement.
    fn describe_statement(&self, id: &str) -> Result<StatementDescription>;
}

impl<C: DataApiClient + ?Sized> DataApiClient for &C {
    fn execute_statement(&self, request: &ExecuteStatementRequest) -> Result<String> {
        (**self).execute_statement(request)
    }

    fn describe_statement(&self, id: &str) -> Result<StatementDescription> {
        (**self).describe_statement(id)
    }
}
