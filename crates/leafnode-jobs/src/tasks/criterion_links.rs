//! Criterion Collection links for films

use async_trait::async_trait;
use leafnode_core::matching::is_criterion_search_link;
use leafnode_core::{EnrichmentTask, JobAbort, JobScope, Resolution, Resolver, RowOutcome};
use leafnode_db::{Database, DbError, Film};
use leafnode_providers::{CriterionLink, FilmQuery};
use std::sync::Arc;
use tracing::debug;

use super::{film_query, quota_abort, row_filter, write_outcome};
use crate::kind::JobKind;

/// Keeps `criterion_url` in line with `is_criterion_collection`.
///
/// Flagged films get a verified film page when one is known and a search
/// link otherwise; search links are re-checked so they upgrade once a
/// verified page is added. Unflagged films lose any link they carry.
pub struct CriterionLinkTask {
    db: Database,
    resolver: Arc<Resolver<FilmQuery, CriterionLink>>,
}

impl CriterionLinkTask {
    pub fn new(db: Database, resolver: Arc<Resolver<FilmQuery, CriterionLink>>) -> Self {
        Self { db, resolver }
    }
}

#[async_trait]
impl EnrichmentTask for CriterionLinkTask {
    type Row = Film;
    type Error = DbError;

    fn name(&self) -> &'static str {
        JobKind::EnrichCriterionLinks.as_str()
    }

    fn describe(&self, film: &Film) -> String {
        format!("{} ({})", film.title, film.id)
    }

    async fn select(&self, scope: &JobScope) -> Result<Vec<Film>, DbError> {
        self.db.select_films_for_criterion(row_filter(scope)).await
    }

    async fn process(&self, film: &Film) -> Result<RowOutcome, JobAbort> {
        if !film.is_criterion_collection {
            debug!("Removing Criterion link from unflagged film '{}'", film.title);
            return Ok(write_outcome(self.db.set_film_criterion_url(&film.id, None).await));
        }

        let resolution = self
            .resolver
            .resolve(&film_query(film))
            .await
            .map_err(quota_abort)?;

        match resolution {
            Resolution::Found { value, .. }
                if film.criterion_url.as_deref() == Some(value.url.as_str()) =>
            {
                Ok(RowOutcome::Unchanged)
            }
            Resolution::Found { value, provider } => {
                let upgrade = film
                    .criterion_url
                    .as_deref()
                    .is_some_and(is_criterion_search_link);
                debug!(
                    "Criterion link for '{}' from {} (verified: {}, replaces search link: {})",
                    film.title, provider, value.verified, upgrade
                );
                Ok(write_outcome(
                    self.db.set_film_criterion_url(&film.id, Some(&value.url)).await,
                ))
            }
            not_found => Ok(RowOutcome::Failed(not_found.failure_summary())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafnode_core::{EnrichmentJob, Provider};
    use leafnode_db::NewFilm;
    use leafnode_providers::{CriterionSearchLink, VerifiedCriterionLinks};
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::testing::create_test_db;

    const SOLARIS_PAGE: &str = "https://www.criterion.com/films/198-solaris";

    fn create_test_task(db: &Database, verified: &[(&str, &str)]) -> CriterionLinkTask {
        let links: HashMap<String, String> = verified
            .iter()
            .map(|(title, url)| (title.to_string(), url.to_string()))
            .collect();
        let chain: Vec<Arc<dyn Provider<FilmQuery, CriterionLink>>> = vec![
            Arc::new(VerifiedCriterionLinks::new(links)),
            Arc::new(CriterionSearchLink),
        ];
        CriterionLinkTask::new(db.clone(), Arc::new(Resolver::new(chain)))
    }

    fn new_film(title: &str, flagged: bool) -> NewFilm {
        NewFilm {
            title: title.to_string(),
            is_criterion_collection: flagged,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_links_flagged_and_clears_unflagged() {
        let (db, _dir) = create_test_db().await;
        let solaris = db.insert_film(new_film("Solaris", true)).await.unwrap();
        let ran = db.insert_film(new_film("Ran", true)).await.unwrap();
        let heat = db.insert_film(new_film("Heat", false)).await.unwrap();
        db.set_film_criterion_url(&heat.id, Some("https://www.criterion.com/films/1-heat"))
            .await
            .unwrap();
        // Not flagged and no link: nothing to do
        db.insert_film(new_film("Alien", false)).await.unwrap();

        let task = create_test_task(&db, &[("Solaris", SOLARIS_PAGE)]);
        let summary = EnrichmentJob::new(Duration::ZERO)
            .run(&task, &JobScope::backlog(50))
            .await
            .unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.successful, 3);

        let stored = db.get_film(&solaris.id).await.unwrap().unwrap();
        assert_eq!(stored.criterion_url.as_deref(), Some(SOLARIS_PAGE));

        let stored = db.get_film(&ran.id).await.unwrap().unwrap();
        assert_eq!(
            stored.criterion_url.as_deref(),
            Some(CriterionSearchLink::url_for("Ran").as_str())
        );

        let stored = db.get_film(&heat.id).await.unwrap().unwrap();
        assert!(stored.criterion_url.is_none());
    }

    #[tokio::test]
    async fn test_search_link_upgrades_once_verified() {
        let (db, _dir) = create_test_db().await;
        let solaris = db.insert_film(new_film("Solaris", true)).await.unwrap();
        let job = EnrichmentJob::new(Duration::ZERO);

        let unverified = create_test_task(&db, &[]);
        let first = job.run(&unverified, &JobScope::backlog(50)).await.unwrap();
        assert_eq!(first.successful, 1);

        // Search links stay selected but are left alone while nothing better exists
        let again = job.run(&unverified, &JobScope::backlog(50)).await.unwrap();
        assert_eq!(again.processed, 1);
        assert_eq!(again.skipped, 1);

        let verified = create_test_task(&db, &[("Solaris", SOLARIS_PAGE)]);
        let upgraded = job.run(&verified, &JobScope::backlog(50)).await.unwrap();
        assert_eq!(upgraded.successful, 1);
        let stored = db.get_film(&solaris.id).await.unwrap().unwrap();
        assert_eq!(stored.criterion_url.as_deref(), Some(SOLARIS_PAGE));

        // A film page is final
        let done = job.run(&verified, &JobScope::backlog(50)).await.unwrap();
        assert_eq!(done.processed, 0);
    }
}
