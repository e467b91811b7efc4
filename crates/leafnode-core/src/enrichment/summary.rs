//! Batch outcome counters

use serde::{Deserialize, Serialize};

/// Error messages beyond this count are dropped from the summary
pub const MAX_REPORTED_ERRORS: usize = 50;

/// Counts returned to the caller of an enrichment job
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSummary {
    /// Rows attempted
    pub processed: u32,
    /// Rows written back
    pub successful: u32,
    /// Rows left untouched because no provider produced usable data
    pub failed: u32,
    /// Rows that needed no change
    pub skipped: u32,
    /// The batch stopped before every selected row was attempted
    pub aborted: bool,
    pub errors: Vec<String>,
}

impl JobSummary {
    pub(crate) fn push_error(&mut self, message: String) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(message);
        }
    }

    /// Human-readable one-liner
    pub fn message(&self, job: &str) -> String {
        let mut message = format!(
            "{}: processed {}, updated {}, failed {}",
            job, self.processed, self.successful, self.failed
        );
        if self.skipped > 0 {
            message.push_str(&format!(", unchanged {}", self.skipped));
        }
        if self.aborted {
            message.push_str(" (stopped early)");
        }
        message
    }
}
