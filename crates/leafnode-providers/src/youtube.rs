//! YouTube Data API trailer search

use async_trait::async_trait;
use leafnode_core::matching::{is_official_trailer, title_matches};
use leafnode_core::{Provider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::http::{parse_json, payload_prefix};
use crate::types::{FilmQuery, TrailerCandidate};

const PROVIDER: &str = "youtube";

/// Error reasons that mean the daily quota is gone
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_results: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            max_results: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Map a failed response to a client error, detecting quota exhaustion
fn classify_error(status: u16, body: &str) -> ClientError {
    if status == 429 {
        return ClientError::QuotaExceeded("HTTP 429".to_string());
    }

    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    if status == 403
        && let Some(parsed) = &parsed
        && let Some(detail) = parsed
            .error
            .errors
            .iter()
            .find(|e| QUOTA_REASONS.contains(&e.reason.as_str()))
    {
        return ClientError::QuotaExceeded(detail.reason.clone());
    }

    ClientError::Upstream {
        status,
        message: parsed
            .map(|p| p.error.message)
            .unwrap_or_else(|| payload_prefix(body).to_string()),
    }
}

/// Decode the handful of entities the API leaves in titles
fn decode_entities(title: &str) -> String {
    title
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn search_query(query: &FilmQuery) -> String {
    match query.year {
        Some(year) => format!("{} {} official trailer", query.title.trim(), year),
        None => format!("{} official trailer", query.title.trim()),
    }
}

fn pick(items: Vec<SearchItem>, wanted_title: &str) -> Option<TrailerCandidate> {
    items.into_iter().find_map(|item| {
        let video_id = item.id.video_id?;
        let title = decode_entities(&item.snippet.title);
        if !is_official_trailer(&title) || !title_matches(wanted_title, &title) {
            debug!("Skipping video {}: {}", video_id, title);
            return None;
        }
        Some(TrailerCandidate {
            url: format!("https://www.youtube.com/watch?v={}", video_id),
            video_id,
            title,
        })
    })
}

pub struct YouTubeClient {
    config: YouTubeConfig,
    client: Client,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Provider<FilmQuery, TrailerCandidate> for YouTubeClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, query: &FilmQuery) -> Result<Option<TrailerCandidate>, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingApiKey(PROVIDER))?;

        let q = search_query(query);
        let max_results = self.config.max_results.to_string();
        debug!("Searching YouTube: {}", q);

        let response = self
            .client
            .get(format!("{}/search", self.config.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", q.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(ClientError::from)?;

        if !(200..300).contains(&status) {
            let err = classify_error(status, &body);
            if matches!(err, ClientError::QuotaExceeded(_)) {
                warn!("YouTube quota exhausted");
            }
            return Err(err.into());
        }

        let parsed: SearchResponse = parse_json(PROVIDER, &body)?;
        Ok(pick(parsed.items, &query.title))
    }
}
