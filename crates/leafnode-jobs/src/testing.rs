//! In-process fakes shared by the job tests

use async_trait::async_trait;
use leafnode_core::{ImageHead, ImageProbe, Provider, ProviderError};
use leafnode_db::Database;
use leafnode_providers::{BookQuery, FilmQuery};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub(crate) async fn create_test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("leafnode.db").display());
    let db = Database::new(&url).await.unwrap();
    (db, dir)
}

/// How a fake provider answers for one title
#[derive(Clone)]
pub(crate) enum Answer<T> {
    Value(T),
    Fail(ProviderError),
    /// Sleep before answering with nothing
    Hang(Duration),
}

/// Provider answering from a title-keyed table; unknown titles get `Ok(None)`
pub(crate) struct TitleProvider<T> {
    name: &'static str,
    answers: HashMap<String, Answer<T>>,
    calls: AtomicUsize,
}

impl<T: Clone> TitleProvider<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            answers: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with(mut self, title: &str, answer: Answer<T>) -> Self {
        self.answers.insert(title.to_string(), answer);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, title: &str) -> Result<Option<T>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(title) {
            Some(Answer::Value(value)) => Ok(Some(value.clone())),
            Some(Answer::Fail(err)) => Err(err.clone()),
            Some(Answer::Hang(duration)) => {
                tokio::time::sleep(*duration).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Provider<FilmQuery, T> for TitleProvider<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, query: &FilmQuery) -> Result<Option<T>, ProviderError> {
        self.answer(&query.title).await
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Provider<BookQuery, T> for TitleProvider<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, query: &BookQuery) -> Result<Option<T>, ProviderError> {
        self.answer(&query.title).await
    }
}

/// Image probe answering from a URL-keyed table; unknown URLs are unreachable
#[derive(Default)]
pub(crate) struct StaticProbe {
    heads: HashMap<String, ImageHead>,
}

impl StaticProbe {
    pub(crate) fn image(mut self, url: &str, content_length: u64) -> Self {
        self.heads.insert(
            url.to_string(),
            ImageHead {
                status: 200,
                content_type: Some("image/jpeg".to_string()),
                content_length: Some(content_length),
            },
        );
        self
    }

    pub(crate) fn head(mut self, url: &str, status: u16, content_type: &str) -> Self {
        self.heads.insert(
            url.to_string(),
            ImageHead {
                status,
                content_type: Some(content_type.to_string()),
                content_length: Some(5000),
            },
        );
        self
    }
}

#[async_trait]
impl ImageProbe for StaticProbe {
    async fn head(&self, url: &str) -> Result<ImageHead, ProviderError> {
        self.heads
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::Http(format!("connection refused: {}", url)))
    }
}
