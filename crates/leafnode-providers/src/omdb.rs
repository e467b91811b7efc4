//! OMDB title lookup

use async_trait::async_trait;
use leafnode_core::matching::title_matches;
use leafnode_core::{Provider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::http::get_json;
use crate::types::{FilmQuery, PosterCandidate};

const PROVIDER: &str = "omdb";

#[derive(Debug, Clone)]
pub struct OmdbConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.omdbapi.com".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TitleResponse {
    response: String,
    title: Option<String>,
    poster: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    error: Option<String>,
}

fn to_candidate(response: TitleResponse, wanted_title: &str) -> Option<PosterCandidate> {
    if !response.response.eq_ignore_ascii_case("true") {
        debug!("OMDB has no match: {}", response.error.unwrap_or_default());
        return None;
    }

    if !response
        .title
        .as_deref()
        .is_some_and(|title| title_matches(wanted_title, title))
    {
        return None;
    }

    let poster = response
        .poster
        .filter(|p| !p.is_empty() && p != "N/A" && p.starts_with("http"))?;

    Some(PosterCandidate {
        url: poster,
        tmdb_id: None,
        imdb_id: response.imdb_id.filter(|id| id != "N/A"),
    })
}

pub struct OmdbClient {
    config: OmdbConfig,
    client: Client,
}

impl OmdbClient {
    pub fn new(config: OmdbConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Provider<FilmQuery, PosterCandidate> for OmdbClient {
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
            .get(format!("{}/", self.config.base_url))
            .query(&[("apikey", api_key), ("t", query.title.trim()), ("type", "movie")]);
        if let Some(year) = query.year {
            request = request.query(&[("y", year)]);
        }

        debug!("Looking up OMDB: {} ({:?})", query.title, query.year);
        let response: TitleResponse = get_json(PROVIDER, request).await?;

        Ok(to_candidate(response, &query.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_json;

    #[test]
    fn test_found_poster() {
        let body = r#"{
            "Title": "Annihilation",
            "Year": "2018",
            "Poster": "https://m.media-amazon.com/images/M/MV5BMTk2Mjc2NzYxNl5BMl5BanBnXkFtZTgwMTA2OTA1NDM@._V1_SX300.jpg",
            "imdbID": "tt2798920",
            "Response": "True"
        }"#;
        let response: TitleResponse = parse_json(PROVIDER, body).unwrap();
        let candidate = to_candidate(response, "Annihilation").unwrap();

        assert_eq!(candidate.imdb_id.as_deref(), Some("tt2798920"));
        assert!(candidate.url.starts_with("https://m.media-amazon.com/"));
    }

    #[test]
    fn test_missing_poster_is_no_match() {
        let body = r#"{"Title": "Ikarie XB 1", "Poster": "N/A", "imdbID": "tt0057184", "Response": "True"}"#;
        let response: TitleResponse = parse_json(PROVIDER, body).unwrap();
        assert_eq!(to_candidate(response, "Ikarie XB 1"), None);
    }

    #[test]
    fn test_not_found_response() {
        let body = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let response: TitleResponse = parse_json(PROVIDER, body).unwrap();
        assert_eq!(to_candidate(response, "Nonexistent"), None);
    }
}
