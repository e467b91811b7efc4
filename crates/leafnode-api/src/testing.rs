//! Router test harness

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use leafnode_auth::{InternalSecret, JwtManager, hash_password};
use leafnode_core::{FanOut, ImageHead, ImageProbe, ImageValidator, JobInvoker, ProviderError, Resolver};
use leafnode_db::{Database, NewUser, User, UserRole};
use leafnode_jobs::{JobCatalog, JobKind, JobSettings, JobTuning, ProviderSet};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::routes::create_router;
use crate::state::AppState;

pub(crate) const TEST_SECRET: &str = "internal-test-secret";
pub(crate) const TEST_PASSWORD: &str = "correct-horse";

/// Probe with no images; every check is unreachable
struct NoImages;

#[async_trait]
impl ImageProbe for NoImages {
    async fn head(&self, url: &str) -> Result<ImageHead, ProviderError> {
        Err(ProviderError::Http(format!("offline: {}", url)))
    }
}

/// Records fan-out dispatches
struct ChannelInvoker {
    tx: mpsc::UnboundedSender<(String, Vec<String>)>,
}

#[async_trait]
impl JobInvoker for ChannelInvoker {
    async fn invoke(&self, job: &str, ids: &[String]) -> Result<(), ProviderError> {
        let _ = self.tx.send((job.to_string(), ids.to_vec()));
        Ok(())
    }
}

pub(crate) struct TestApp {
    pub state: AppState,
    pub dispatched: mpsc::UnboundedReceiver<(String, Vec<String>)>,
    _dir: TempDir,
}

impl TestApp {
    pub(crate) fn router(&self) -> Router {
        create_router(self.state.clone(), None)
    }

    pub(crate) async fn create_user(&self, username: &str, role: UserRole) -> User {
        self.state
            .db
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn bearer(&self, username: &str, role: UserRole) -> String {
        let user = self.create_user(username, role).await;
        format!("Bearer {}", self.state.jwt.generate_token(&user).unwrap())
    }
}

/// App with empty provider chains, no delays and trailers unconfigured
pub(crate) async fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("leafnode.db").display());
    let db = Database::new(&url).await.unwrap();

    let providers = ProviderSet::from_parts(
        Resolver::new(vec![]),
        Resolver::new(vec![]),
        Resolver::new(vec![]),
        Resolver::new(vec![]),
        ImageValidator::new(Arc::new(NoImages)),
    )
    .with_missing(JobKind::EnrichTrailers, "providers.youtube_api_key");

    let mut settings = JobSettings::default();
    for kind in JobKind::ALL {
        settings.overrides.insert(
            kind,
            JobTuning {
                batch_size: kind.default_batch_size(),
                delay: Duration::ZERO,
            },
        );
    }

    let (tx, dispatched) = mpsc::unbounded_channel();
    let state = AppState::new(
        db.clone(),
        JobCatalog::new(db, Arc::new(providers), settings),
        FanOut::new(Arc::new(ChannelInvoker { tx })),
        Arc::new(JwtManager::new("test-jwt-secret", 1)),
        InternalSecret::new(TEST_SECRET),
        true,
    );

    TestApp {
        state,
        dispatched,
        _dir: dir,
    }
}

/// Send a request and decode the JSON response
pub(crate) async fn send(
    app: Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, payload)
}
