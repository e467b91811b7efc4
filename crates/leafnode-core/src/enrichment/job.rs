//! Sequential batch driver

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::summary::JobSummary;

/// Which rows a job run should consider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobScope {
    /// Restrict the run to these primary keys
    pub ids: Option<Vec<String>>,
    /// Maximum number of rows to select
    pub limit: usize,
}

impl JobScope {
    pub fn backlog(limit: usize) -> Self {
        Self { ids: None, limit }
    }

    pub fn for_ids(ids: Vec<String>, limit: usize) -> Self {
        Self {
            ids: Some(ids),
            limit,
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.ids.is_some()
    }
}

/// Result of processing a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// New value(s) were written back
    Updated,
    /// The row already had what it needs
    Unchanged,
    /// Left untouched, with a reason for the summary
    Failed(String),
}

/// Stop the remaining batch (e.g. provider quota exhausted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAbort {
    pub reason: String,
}

impl JobAbort {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// One kind of enrichment: selection of rows plus per-row processing
#[async_trait]
pub trait EnrichmentTask: Send + Sync {
    type Row: Send + Sync;
    type Error: Send;

    /// Job name used in logs and summaries
    fn name(&self) -> &'static str;

    /// Short label for a row, used in error messages
    fn describe(&self, row: &Self::Row) -> String;

    /// Rows missing the target field
    async fn select(&self, scope: &JobScope) -> Result<Vec<Self::Row>, Self::Error>;

    /// Fill in one row. Only `Err` stops the batch.
    async fn process(&self, row: &Self::Row) -> Result<RowOutcome, JobAbort>;
}

/// Walks selected rows one by one with a fixed delay between them
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentJob {
    delay: Duration,
}

impl EnrichmentJob {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` over the rows selected by `scope`.
    ///
    /// Only a selection failure is returned as an error. Rows already
    /// written stay written if a later row fails or the batch aborts.
    pub async fn run<T>(&self, task: &T, scope: &JobScope) -> Result<JobSummary, T::Error>
    where
        T: EnrichmentTask,
    {
        let rows = task.select(scope).await?;
        info!(
            "{}: {} rows selected (scoped: {}, limit: {})",
            task.name(),
            rows.len(),
            scope.is_scoped(),
            scope.limit
        );

        let mut summary = JobSummary::default();

        for (idx, row) in rows.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            summary.processed += 1;

            match task.process(row).await {
                Ok(RowOutcome::Updated) => {
                    debug!("{}: updated {}", task.name(), task.describe(row));
                    summary.successful += 1;
                }
                Ok(RowOutcome::Unchanged) => {
                    summary.skipped += 1;
                }
                Ok(RowOutcome::Failed(reason)) => {
                    debug!("{}: failed {}: {}", task.name(), task.describe(row), reason);
                    summary.failed += 1;
                    summary.push_error(format!("{}: {}", task.describe(row), reason));
                }
                Err(abort) => {
                    warn!(
                        "{}: stopping batch at {}: {}",
                        task.name(),
                        task.describe(row),
                        abort.reason
                    );
                    summary.failed += 1;
                    summary.aborted = true;
                    summary.push_error(format!("{}: {}", task.describe(row), abort.reason));
                    break;
                }
            }
        }

        info!("{}", summary.message(task.name()));
        Ok(summary)
    }
}
