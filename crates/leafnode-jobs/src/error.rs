//! Job error types

use leafnode_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
