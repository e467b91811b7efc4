//! Criterion Collection links
//!
//! There is no Criterion API. Film pages come from a curated list of
//! verified links; anything else gets a site search URL.

use async_trait::async_trait;
use leafnode_core::matching::{CRITERION_SEARCH_PREFIX, normalize_title};
use leafnode_core::{Provider, ProviderError};
use std::collections::HashMap;
use tracing::info;
use url::form_urlencoded;

use crate::types::{CriterionLink, FilmQuery};

/// Curated film-page links keyed by normalized title
#[derive(Debug, Clone, Default)]
pub struct VerifiedCriterionLinks {
    links: HashMap<String, String>,
}

impl VerifiedCriterionLinks {
    pub fn new(links: HashMap<String, String>) -> Self {
        let links: HashMap<String, String> = links
            .into_iter()
            .map(|(title, url)| (normalize_title(&title), url))
            .collect();
        info!("Loaded {} verified Criterion links", links.len());
        Self { links }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.links.get(&normalize_title(title)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl Provider<FilmQuery, CriterionLink> for VerifiedCriterionLinks {
    fn name(&self) -> &'static str {
        "criterion_verified"
    }

    async fn lookup(&self, query: &FilmQuery) -> Result<Option<CriterionLink>, ProviderError> {
        Ok(self.get(&query.title).map(|url| CriterionLink {
            url: url.to_string(),
            verified: true,
        }))
    }
}

/// Fallback that always produces a search URL for the title
#[derive(Debug, Clone, Copy, Default)]
pub struct CriterionSearchLink;

impl CriterionSearchLink {
    pub fn url_for(title: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(title.trim().as_bytes()).collect();
        format!("{}{}", CRITERION_SEARCH_PREFIX, encoded)
    }
}

#[async_trait]
impl Provider<FilmQuery, CriterionLink> for CriterionSearchLink {
    fn name(&self) -> &'static str {
        "criterion_search"
    }

    async fn lookup(&self, query: &FilmQuery) -> Result<Option<CriterionLink>, ProviderError> {
        if query.title.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(CriterionLink {
            url: Self::url_for(&query.title),
            verified: false,
        }))
    }
}
