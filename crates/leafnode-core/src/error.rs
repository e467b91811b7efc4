//! Core error types

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a single external provider.
///
/// Everything except `QuotaExceeded` is treated as "no result from this
/// provider" by the resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Provider returned error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded(_))
    }
}

/// Error that stops resolution for the whole batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{provider} quota exceeded: {message}")]
    QuotaExceeded {
        provider: &'static str,
        message: String,
    },
}
