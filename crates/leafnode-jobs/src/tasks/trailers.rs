//! Trailer links for films

use async_trait::async_trait;
use leafnode_core::{EnrichmentTask, JobAbort, JobScope, Resolution, Resolver, RowOutcome};
use leafnode_db::{Database, DbError, Film};
use leafnode_providers::{FilmQuery, TrailerCandidate};
use std::sync::Arc;
use tracing::debug;

use super::{film_query, quota_abort, row_filter, write_outcome};
use crate::kind::JobKind;

/// Fills `trailer_url` on films that have none.
///
/// The search API has a small daily quota, so running out of it stops the
/// batch instead of failing every remaining row.
pub struct TrailerTask {
    db: Database,
    resolver: Arc<Resolver<FilmQuery, TrailerCandidate>>,
}

impl TrailerTask {
    pub fn new(db: Database, resolver: Arc<Resolver<FilmQuery, TrailerCandidate>>) -> Self {
        Self { db, resolver }
    }
}

#[async_trait]
impl EnrichmentTask for TrailerTask {
    type Row = Film;
    type Error = DbError;

    fn name(&self) -> &'static str {
        JobKind::EnrichTrailers.as_str()
    }

    fn describe(&self, film: &Film) -> String {
        format!("{} ({})", film.title, film.id)
    }

    async fn select(&self, scope: &JobScope) -> Result<Vec<Film>, DbError> {
        self.db.select_films_missing_trailer(row_filter(scope)).await
    }

    async fn process(&self, film: &Film) -> Result<RowOutcome, JobAbort> {
        let resolution = self
            .resolver
            .resolve(&film_query(film))
            .await
            .map_err(quota_abort)?;

        match resolution {
            Resolution::Found { value, .. } => {
                debug!("Trailer for '{}': {} ({})", film.title, value.url, value.title);
                Ok(write_outcome(self.db.update_film_trailer(&film.id, &value.url).await))
            }
            not_found => Ok(RowOutcome::Failed(not_found.failure_summary())),
        }
    }
}
