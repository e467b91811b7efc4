//! Batch enrichment driver
//!
//! An [`EnrichmentTask`] knows how to select rows that are missing a field
//! and how to fill one row in. [`EnrichmentJob`] walks the selected rows
//! one at a time, pacing requests and tallying a [`JobSummary`].

mod job;
mod summary;

pub use job::{EnrichmentJob, EnrichmentTask, JobAbort, JobScope, RowOutcome};
pub use summary::{JobSummary, MAX_REPORTED_ERRORS};
