//! Ordered multi-provider resolver
//!
//! Providers are tried in priority order. The first candidate that passes
//! validation wins and later providers are never called. Ordinary provider
//! failures only move resolution on to the next provider; a quota failure
//! is the one condition that escapes, so the caller can stop its batch.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ProviderError, ResolveError};
use crate::validation::CandidateValidator;

/// Default bound on a single provider lookup
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// A single external source able to answer a query
#[async_trait]
pub trait Provider<Q: Sync, T: Send>: Send + Sync {
    /// Stable provider name used in logs and results
    fn name(&self) -> &'static str;

    /// Look up the best candidate, `Ok(None)` when the provider has nothing
    async fn lookup(&self, query: &Q) -> Result<Option<T>, ProviderError>;
}

/// Why a provider was passed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: &'static str,
    pub reason: String,
}

impl ProviderFailure {
    pub fn new(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            provider,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Result of running the provider chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found { value: T, provider: &'static str },
    NotFound { failures: Vec<ProviderFailure> },
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    /// Summary of every provider failure, for error reporting
    pub fn failure_summary(&self) -> String {
        match self {
            Resolution::Found { provider, .. } => format!("found by {}", provider),
            Resolution::NotFound { failures } if failures.is_empty() => {
                "no providers configured".to_string()
            }
            Resolution::NotFound { failures } => failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Tries providers in order and stops at the first validated hit
pub struct Resolver<Q: Sync, T: Send + Sync> {
    providers: Vec<Arc<dyn Provider<Q, T>>>,
    validator: Option<Arc<dyn CandidateValidator<T>>>,
    timeout: Duration,
}

impl<Q, T> Resolver<Q, T>
where
    Q: Sync,
    T: Send + Sync,
{
    pub fn new(providers: Vec<Arc<dyn Provider<Q, T>>>) -> Self {
        Self {
            providers,
            validator: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Require every candidate to pass `validator` before it is accepted
    pub fn with_validator(mut self, validator: Arc<dyn CandidateValidator<T>>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run the chain for one query
    pub async fn resolve(&self, query: &Q) -> Result<Resolution<T>, ResolveError> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();

            let outcome = match timeout(self.timeout, provider.lookup(query)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(Some(candidate)) => {
                    if let Some(validator) = &self.validator
                        && !validator.validate(&candidate).await
                    {
                        debug!("{} candidate failed validation", name);
                        failures.push(ProviderFailure::new(name, "candidate failed validation"));
                        continue;
                    }

                    debug!("Resolved by {}", name);
                    return Ok(Resolution::Found {
                        value: candidate,
                        provider: name,
                    });
                }
                Ok(None) => {
                    debug!("{} returned no match", name);
                    failures.push(ProviderFailure::new(name, "no match"));
                }
                Err(ProviderError::QuotaExceeded(message)) => {
                    warn!("{} quota exceeded: {}", name, message);
                    return Err(ResolveError::QuotaExceeded {
                        provider: name,
                        message,
                    });
                }
                Err(e) => {
                    warn!("{} lookup failed: {}", name, e);
                    failures.push(ProviderFailure::new(name, e.to_string()));
                }
            }
        }

        Ok(Resolution::NotFound { failures })
    }
}
