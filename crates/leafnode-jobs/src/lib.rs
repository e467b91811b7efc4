//! leafnode enrichment jobs
//!
//! Concrete enrichment tasks over the library tables and the catalog that
//! checks configuration, runs a job and records its outcome.

pub mod catalog;
pub mod error;
pub mod kind;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use catalog::{JobCatalog, JobRequest, JobSettings, JobTuning, ProviderSet, ProviderSetConfig};
pub use error::JobError;
pub use kind::JobKind;
pub use tasks::{BookCoverTask, CriterionLinkTask, FilmPosterTask, ImageSweepTask, SweepTarget, TrailerTask};
