//! Application state

use leafnode_auth::{InternalSecret, JwtManager};
use leafnode_core::FanOut;
use leafnode_db::Database;
use leafnode_jobs::JobCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jobs: JobCatalog,
    pub fanout: FanOut,
    pub jwt: Arc<JwtManager>,
    /// Secret accepted from other jobs; `None` disables job-to-job calls
    pub internal_secret: Option<InternalSecret>,
    pub auth_enabled: bool,
}

impl AppState {
    pub fn new(
        db: Database,
        jobs: JobCatalog,
        fanout: FanOut,
        jwt: Arc<JwtManager>,
        internal_secret: Option<InternalSecret>,
        auth_enabled: bool,
    ) -> Self {
        Self {
            db,
            jobs,
            fanout,
            jwt,
            internal_secret,
            auth_enabled,
        }
    }
}
