//! Provider client error types

use leafnode_core::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => {
                ProviderError::Http(format!("request timed out: {}", e))
            }
            ClientError::Http(e) => ProviderError::Http(e.to_string()),
            ClientError::Upstream { status, message } => ProviderError::Upstream { status, message },
            ClientError::QuotaExceeded(message) => ProviderError::QuotaExceeded(message),
            ClientError::InvalidResponse(message) => ProviderError::InvalidResponse(message),
            ClientError::MissingApiKey(provider) => ProviderError::NotConfigured(provider.to_string()),
        }
    }
}
