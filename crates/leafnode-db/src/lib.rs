//! leafnode database layer
//!
//! SQLite persistence (via sqlx) for the library rows the enrichment jobs
//! fill in, admin users and the history of job runs.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, RowFilter};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
