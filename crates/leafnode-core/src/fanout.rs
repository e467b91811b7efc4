//! Fire-and-forget triggering of sibling jobs

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::ProviderError;

/// Header carrying the shared secret between jobs
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Something that can start a named job for a set of row ids
#[async_trait]
pub trait JobInvoker: Send + Sync {
    async fn invoke(&self, job: &str, ids: &[String]) -> Result<(), ProviderError>;
}

/// Dispatches jobs without waiting for them
#[derive(Clone)]
pub struct FanOut {
    invoker: Option<Arc<dyn JobInvoker>>,
}

impl FanOut {
    pub fn new(invoker: Arc<dyn JobInvoker>) -> Self {
        Self {
            invoker: Some(invoker),
        }
    }

    /// A fan-out that only logs what it would have dispatched
    pub fn disabled() -> Self {
        Self { invoker: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.invoker.is_some()
    }

    /// Start every job in `jobs` for `ids` and return immediately.
    ///
    /// Each dispatch runs in its own task; failures are logged there and
    /// never reach the caller.
    pub fn trigger(&self, jobs: &[&str], ids: Vec<String>) {
        let Some(invoker) = &self.invoker else {
            debug!("Fan-out disabled, skipping {:?} for {} ids", jobs, ids.len());
            return;
        };

        if ids.is_empty() {
            return;
        }

        let ids = Arc::new(ids);
        for job in jobs {
            let job = job.to_string();
            let invoker = invoker.clone();
            let ids = ids.clone();

            // Detached: the handle is dropped on purpose
            tokio::spawn(async move {
                match invoker.invoke(&job, &ids).await {
                    Ok(()) => {
                        info!("Dispatched {} for {} ids", job, ids.len());
                        metrics::counter!(
                            "leafnode_fanout_dispatch_total",
                            "job" => job.clone(),
                            "outcome" => "ok"
                        )
                        .increment(1);
                    }
                    Err(e) => {
                        warn!("Failed to dispatch {}: {}", job, e);
                        metrics::counter!(
                            "leafnode_fanout_dispatch_total",
                            "job" => job.clone(),
                            "outcome" => "error"
                        )
                        .increment(1);
                    }
                }
            });
        }
    }
}
