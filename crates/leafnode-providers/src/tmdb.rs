//! TMDB movie search

use async_trait::async_trait;
use leafnode_core::matching::title_matches;
use leafnode_core::{Provider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::http::get_json;
use crate::types::{FilmQuery, PosterCandidate};

const PROVIDER: &str = "tmdb";

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub api_key: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Movie>,
}

#[derive(Debug, Deserialize)]
struct Movie {
    id: i64,
    #[serde(default)]
    title: String,
    original_title: Option<String>,
    poster_path: Option<String>,
}

impl Movie {
    fn matches(&self, wanted: &str) -> bool {
        title_matches(wanted, &self.title)
            || self
                .original_title
                .as_deref()
                .is_some_and(|original| title_matches(wanted, original))
    }
}

pub struct TmdbClient {
    config: TmdbConfig,
    client: Client,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn pick(&self, movies: &[Movie], wanted_title: &str) -> Option<PosterCandidate> {
        movies
            .iter()
            .filter(|movie| movie.matches(wanted_title))
            .find_map(|movie| {
                let path = movie.poster_path.as_deref().filter(|p| !p.is_empty())?;
                Some(PosterCandidate {
                    url: format!("{}/w500{}", self.config.image_base_url, path),
                    tmdb_id: Some(movie.id),
                    imdb_id: None,
                })
            })
    }
}

#[async_trait]
impl Provider<FilmQuery, PosterCandidate> for TmdbClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, query: &FilmQuery) -> Result<Option<PosterCandidate>, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingApiKey(PROVIDER))?;

        let mut request = self
            .client
            .get(format!("{}/search/movie", self.config.base_url))
            .query(&[
                ("api_key", api_key),
                ("query", query.title.trim()),
                ("include_adult", "false"),
            ]);
        if let Some(year) = query.year {
            request = request.query(&[("year", year)]);
        }

        debug!("Searching TMDB: {} ({:?})", query.title, query.year);
        let response: SearchResponse = get_json(PROVIDER, request).await?;

        Ok(self.pick(&response.results, &query.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_json;

    #[test]
    fn test_pick_uses_w500_poster() {
        let body = r#"{
            "page": 1,
            "results": [
                { "id": 1, "title": "Arrival of the Body Snatchers", "poster_path": "/x.jpg" },
                { "id": 329865, "title": "Arrival", "poster_path": null },
                { "id": 329866, "title": "Arrival", "poster_path": "/x2QuPEf0ASKh7tN1pXRL3Ie9L9f.jpg" }
            ],
            "total_results": 3
        }"#;
        let response: SearchResponse = parse_json(PROVIDER, body).unwrap();
        let client = TmdbClient::new(TmdbConfig::default(), Client::new());

        // Title containment lets the first result through, so order matters
        let candidate = client.pick(&response.results[1..], "Arrival").unwrap();
        assert_eq!(
            candidate.url,
            "https://image.tmdb.org/t/p/w500/x2QuPEf0ASKh7tN1pXRL3Ie9L9f.jpg"
        );
        assert_eq!(candidate.tmdb_id, Some(329866));
    }

    #[test]
    fn test_pick_matches_original_title() {
        let body = r#"{
            "results": [
                { "id": 593, "title": "Solaris", "original_title": "Солярис", "poster_path": "/s.jpg" },
                { "id": 1398, "title": "Stalker", "original_title": "Сталкер", "poster_path": "/t.jpg" }
            ]
        }"#;
        let response: SearchResponse = parse_json(PROVIDER, body).unwrap();
        let client = TmdbClient::new(TmdbConfig::default(), Client::new());

        assert_eq!(client.pick(&response.results, "Сталкер").unwrap().tmdb_id, Some(1398));
        assert_eq!(client.pick(&response.results, "Ikarie XB 1"), None);
    }

    #[tokio::test]
    async fn test_lookup_without_key_is_not_configured() {
        let client = TmdbClient::new(TmdbConfig::default(), Client::new());
        let result = client
            .lookup(&FilmQuery {
                title: "Arrival".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
