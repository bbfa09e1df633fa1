#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use sales_forecast_pipeline::unload::{
    DataApiClient, ExecuteStatementRequest, PollMode, Result, StatementDescription,
    StatementStatus, TriggerConfig, UnloadRequest,
};

/// Data API fake answering `describe_statement` from a scripted status sequence.
/// The last entry is repeated once the script runs out.
pub struct ScriptedClient {
    script: RefCell<VecDeque<StatementDescription>>,
    last: RefCell<Option<StatementDescription>>,
    pub submitted: RefCell<Vec<ExecuteStatementRequest>>,
    pub describe_calls: Cell<usize>,
}

impl ScriptedClient {
    pub fn new(statuses: &[StatementStatus]) -> Self {
        Self::with_descriptions(
            statuses
                .iter()
                .map(|status| StatementDescription {
                    status: status.clone(),
                    error: None,
                })
                .collect(),
        )
    }

    pub fn with_descriptions(script: Vec<StatementDescription>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            last: RefCell::new(None),
            submitted: RefCell::new(Vec::new()),
            describe_calls: Cell::new(0),
        }
    }
}

impl DataApiClient for ScriptedClient {
    fn execute_statement(&self, request: &ExecuteStatementRequest) -> Result<String> {
        self.submitted.borrow_mut().push(request.clone());
        Ok(String::from("exec-1"))
    }

    fn describe_statement(&self, id: &str) -> Result<StatementDescription> {
        assert_eq!(id, "exec-1");
        self.describe_calls.set(self.describe_calls.get() + 1);
        let next = self.script.borrow_mut().pop_front();
        let desc = match next {
            Some(desc) => {
                *self.last.borrow_mut() = Some(desc.clone());
                desc
            }
            None => self
                .last
                .borrow()
                .clone()
                .expect("script must not be empty"),
        };
        Ok(desc)
    }
}

pub fn failed(error: &str) -> StatementDescription {
    StatementDescription {
        status: StatementStatus::Failed,
        error: Some(error.to_string()),
    }
}

pub fn config(mode: PollMode) -> TriggerConfig {
    TriggerConfig {
        mode,
        poll_interval: Duration::ZERO,
        ..TriggerConfig::default()
    }
}

pub fn request() -> UnloadRequest {
    UnloadRequest {
        cluster_id: String::from("redshift-cluster-1"),
        sql_query: String::from("SELECT * from sales"),
        s3_path: String::from("s3://bucket/some/prefix/"),
        role: String::from("arn:aws:iam::123456789012:role/unload"),
        partition_by_column: String::from("caldate"),
    }
}
