//! leafnode HTTP API
//!
//! Axum routes for the job endpoints (`/functions/v1/{job}`), the library
//! and run history API, login, health checks and Prometheus metrics.

pub mod error;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
