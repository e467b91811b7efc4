//! Google Books volumes search

use async_trait::async_trait;
use leafnode_core::matching::title_matches;
use leafnode_core::{CacheStats, Clock, Provider, ProviderError, RateLimiter, TtlCache, TtlCacheConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::http::get_json;
use crate::types::{BookQuery, CoverCandidate};

const PROVIDER: &str = "google_books";

#[derive(Debug, Clone)]
pub struct GoogleBooksConfig {
    pub base_url: String,
    /// Optional; unauthenticated requests share a lower quota
    pub api_key: Option<String>,
    pub cache: TtlCacheConfig,
    pub max_requests: usize,
    pub time_window: Duration,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1".to_string(),
            api_key: None,
            cache: TtlCacheConfig::default(),
            max_requests: 100,
            time_window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
    extra_large: Option<String>,
}

impl ImageLinks {
    fn largest(&self) -> Option<&str> {
        [
            &self.extra_large,
            &self.large,
            &self.medium,
            &self.small,
            &self.thumbnail,
            &self.small_thumbnail,
        ]
        .into_iter()
        .find_map(|link| link.as_deref())
    }
}

/// Google Books client with a per-process result cache and rate limiter
pub struct GoogleBooksClient {
    config: GoogleBooksConfig,
    client: Client,
    cache: TtlCache<Vec<Volume>>,
    limiter: RateLimiter,
}

impl GoogleBooksClient {
    pub fn new(config: GoogleBooksConfig, client: Client, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Created Google Books client (api key: {}, limit: {} per {:?})",
            config.api_key.is_some(),
            config.max_requests,
            config.time_window
        );

        Self {
            cache: TtlCache::new(config.cache, clock.clone()),
            limiter: RateLimiter::new(config.max_requests, config.time_window, clock),
            config,
            client,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Search volumes, served from cache when possible.
    ///
    /// A request denied by the rate limiter yields an empty result.
    async fn search(&self, query: &str) -> Result<Vec<Volume>, ClientError> {
        if let Some(volumes) = self.cache.get(query) {
            debug!("Google Books cache hit: {}", query);
            return Ok(volumes);
        }

        if !self.limiter.try_acquire() {
            warn!(
                "Google Books rate limit reached ({} calls in window), skipping: {}",
                self.limiter.in_flight(),
                query
            );
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .get(format!("{}/volumes", self.config.base_url))
            .query(&[("q", query), ("maxResults", "10")]);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        debug!("Searching Google Books: {}", query);
        let response: VolumesResponse = get_json(PROVIDER, request).await?;
        self.cache.set(query, response.items.clone());
        Ok(response.items)
    }
}

/// `isbn:<isbn>` query, if the book has a usable ISBN
fn isbn_query(query: &BookQuery) -> Option<String> {
    query.clean_isbn().map(|isbn| format!("isbn:{}", isbn))
}

fn title_query(query: &BookQuery) -> String {
    match query.author.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(author) => format!("intitle:{} inauthor:{}", query.title.trim(), author.trim()),
        None => format!("intitle:{}", query.title.trim()),
    }
}

/// Force https and drop the curled-page effect
fn clean_image_url(url: &str) -> String {
    let url = match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    };
    url.replace("&edge=curl", "")
}

fn best_candidate(volumes: &[Volume], wanted_title: Option<&str>) -> Option<CoverCandidate> {
    volumes.iter().find_map(|volume| {
        if let Some(wanted) = wanted_title
            && !title_matches(wanted, &volume.volume_info.title)
        {
            return None;
        }
        let link = volume.volume_info.image_links.as_ref()?.largest()?;
        Some(CoverCandidate {
            url: clean_image_url(link),
            google_books_id: Some(volume.id.clone()),
        })
    })
}

#[async_trait]
impl Provider<BookQuery, CoverCandidate> for GoogleBooksClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, query: &BookQuery) -> Result<Option<CoverCandidate>, ProviderError> {
        // An exact ISBN hit wins over a fuzzy title search
        if let Some(isbn) = isbn_query(query) {
            let volumes = self.search(&isbn).await?;
            if let Some(candidate) = best_candidate(&volumes, None) {
                return Ok(Some(candidate));
            }
        }

        if query.title.trim().is_empty() {
            return Ok(None);
        }

        let volumes = self.search(&title_query(query)).await?;
        Ok(best_candidate(&volumes, Some(&query.title)))
    }
}
