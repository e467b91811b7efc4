//! Job names and their defaults

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::JobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    EnrichBookCovers,
    EnrichFilmPosters,
    EnrichTrailers,
    EnrichCriterionLinks,
    ValidateImages,
}

impl JobKind {
    pub const ALL: [JobKind; 5] = [
        JobKind::EnrichBookCovers,
        JobKind::EnrichFilmPosters,
        JobKind::EnrichTrailers,
        JobKind::EnrichCriterionLinks,
        JobKind::ValidateImages,
    ];

    /// Jobs started for a newly inserted book
    pub const BOOK_SIBLINGS: [JobKind; 1] = [JobKind::EnrichBookCovers];

    /// Jobs started for a newly inserted film
    pub const FILM_SIBLINGS: [JobKind; 3] = [
        JobKind::EnrichFilmPosters,
        JobKind::EnrichTrailers,
        JobKind::EnrichCriterionLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::EnrichBookCovers => "enrich-book-covers",
            JobKind::EnrichFilmPosters => "enrich-film-posters",
            JobKind::EnrichTrailers => "enrich-trailers",
            JobKind::EnrichCriterionLinks => "enrich-criterion-links",
            JobKind::ValidateImages => "validate-images",
        }
    }

    pub fn default_batch_size(&self) -> usize {
        match self {
            JobKind::EnrichBookCovers => 50,
            JobKind::EnrichFilmPosters => 20,
            JobKind::EnrichTrailers => 10,
            JobKind::EnrichCriterionLinks => 50,
            JobKind::ValidateImages => 50,
        }
    }

    /// Pause between rows
    pub fn default_delay(&self) -> Duration {
        match self {
            JobKind::EnrichBookCovers => Duration::from_millis(300),
            JobKind::EnrichFilmPosters => Duration::from_millis(500),
            JobKind::EnrichTrailers => Duration::from_millis(1000),
            JobKind::EnrichCriterionLinks => Duration::ZERO,
            JobKind::ValidateImages => Duration::from_millis(300),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| JobError::UnknownJob(s.to_string()))
    }
}
