//! Submits an UNLOAD statement and waits for it to settle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

use super::client::{DataApiClient, ExecuteStatementRequest, StatementStatus};
use super::config::{PollMode, TriggerConfig};
use super::error::{Error, Result};

/// Parameters of one partitioned export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadRequest {
    pub cluster_id: String,
    pub sql_query: String,
    pub s3_path: String,
    pub role: String,
    pub partition_by_column: String,
}

impl UnloadRequest {
    /// Builds the UNLOAD statement. Values are embedded as-is, without escaping.
    pub fn statement(&self) -> String {
        format!(
            "unload ('{}') TO '{}' iam_role '{}' partition by ({}) csv header parallel off;",
            self.sql_query, self.s3_path, self.role, self.partition_by_column
        )
    }
}

/// Runs unload statements against a data API client.
pub struct UnloadTrigger<C> {
    client: C,
    config: TriggerConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl<C: DataApiClient> UnloadTrigger<C> {
    pub fn new(client: C, config: TriggerConfig) -> Self {
        Self {
            client,
            config,
            cancel: None,
        }
    }

    /// Polling stops with [`Error::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Submits `request` and returns whether the unload succeeded.
    pub fn run(&self, request: &UnloadRequest) -> Result<bool> {
        let id = self.client.execute_statement(&ExecuteStatementRequest {
            cluster_identifier: request.cluster_id.clone(),
            database: self.config.database.clone(),
            db_user: self.config.db_user.clone(),
            sql: request.statement(),
        })?;
        info!("Submitted unload statement {id} to {}", request.s3_path);

        match self.config.mode {
            PollMode::FirstCheck => self.wait_first_check(&id),
            PollMode::UntilTerminal => self.wait_until_terminal(&id),
        }
    }

    /// Mirrors the deployed handler: the wait loop returns from inside its first pass,
    /// so only one status after the initial one is ever looked at.
    fn wait_first_check(&self, id: &str) -> Result<bool> {
        let status = self.client.describe_statement(id)?.status;
        info!("{status}");
        if status.is_terminal() {
            // Loop body never runs, nothing reports success.
            return Ok(false);
        }

        self.sleep(id, self.config.poll_interval)?;
        let status = self.client.describe_statement(id)?.status;
        info!("{status}");
        if status == StatementStatus::Failed {
            let detail = self.client.describe_statement(id)?.error;
            error!("{}", detail.as_deref().unwrap_or("no error detail"));
            return Ok(false);
        }
        Ok(true)
    }

    fn wait_until_terminal(&self, id: &str) -> Result<bool> {
        let started = Instant::now();
        let mut interval = self.config.poll_interval;
        let mut desc = self.client.describe_statement(id)?;
        info!("{}", desc.status);

        loop {
            match desc.status {
                StatementStatus::Finished => return Ok(true),
                StatementStatus::Failed | StatementStatus::Aborted => {
                    error!(
                        "Statement {id} {}: {}",
                        desc.status,
                        desc.error.as_deref().unwrap_or("no error detail")
                    );
                    return Ok(false);
                }
                _ => {}
            }

            if let Some(timeout) = self.config.timeout {
                let elapsed = started.elapsed();
                let next_poll = elapsed.checked_add(interval);
                if next_poll.map_or(true, |at| at > timeout) {
                    return Err(Error::Timeout {
                        id: id.to_string(),
                        status: desc.status.to_string(),
                        elapsed,
                    });
                }
            }

            self.sleep(id, interval)?;
            interval = self.config.next_interval(interval);
            desc = self.client.describe_statement(id)?;
            info!("{}", desc.status);
        }
    }

    fn sleep(&self, id: &str, duration: Duration) -> Result<()> {
        self.check_cancelled(id)?;
        if !duration.is_zero() {
            thread::sleep(duration);
        }
        self.check_cancelled(id)
    }

    fn check_cancelled(&self, id: &str) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Cancelled {
                id: id.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
