//! Queries and candidates exchanged with the resolver

use leafnode_core::ImageCandidate;
use serde::{Deserialize, Serialize};

/// What is known about a book when looking for its cover
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl BookQuery {
    /// ISBN with separators stripped, if it looks usable
    pub fn clean_isbn(&self) -> Option<String> {
        let isbn: String = self
            .isbn
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .collect();
        matches!(isbn.len(), 10 | 13).then(|| isbn.to_ascii_uppercase())
    }
}

/// What is known about a film when looking for poster, trailer or links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilmQuery {
    pub title: String,
    pub year: Option<i32>,
    pub director: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverCandidate {
    pub url: String,
    pub google_books_id: Option<String>,
}

impl ImageCandidate for CoverCandidate {
    fn image_url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterCandidate {
    pub url: String,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
}

impl ImageCandidate for PosterCandidate {
    fn image_url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailerCandidate {
    pub url: String,
    pub video_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionLink {
    pub url: String,
    /// A film page from the verified list, as opposed to a search URL
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_isbn() {
        let query = BookQuery {
            title: "Hyperion".to_string(),
            author: None,
            isbn: Some("978-0-553-28368-5".to_string()),
        };
        assert_eq!(query.clean_isbn(), Some("9780553283685".to_string()));

        let short = BookQuery {
            isbn: Some("12345".to_string()),
            ..query.clone()
        };
        assert_eq!(short.clean_isbn(), None);

        let isbn10 = BookQuery {
            isbn: Some("0-441-17271-x".to_string()),
            ..query
        };
        assert_eq!(isbn10.clean_isbn(), Some("044117271X".to_string()));
    }
}
