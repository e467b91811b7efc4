//! Poster images for films

use async_trait::async_trait;
use leafnode_core::{EnrichmentTask, JobAbort, JobScope, Resolution, Resolver, RowOutcome};
use leafnode_db::{Database, DbError, Film};
use leafnode_providers::{FilmQuery, PosterCandidate};
use std::sync::Arc;
use tracing::debug;

use super::{film_query, quota_abort, row_filter, write_outcome};
use crate::kind::JobKind;

/// Fills `poster_url` on films that have none
pub struct FilmPosterTask {
    db: Database,
    resolver: Arc<Resolver<FilmQuery, PosterCandidate>>,
}

impl FilmPosterTask {
    pub fn new(db: Database, resolver: Arc<Resolver<FilmQuery, PosterCandidate>>) -> Self {
        Self { db, resolver }
    }
}

#[async_trait]
impl EnrichmentTask for FilmPosterTask {
    type Row = Film;
    type Error = DbError;

    fn name(&self) -> &'static str {
        JobKind::EnrichFilmPosters.as_str()
    }

    fn describe(&self, film: &Film) -> String {
        format!("{} ({})", film.title, film.id)
    }

    async fn select(&self, scope: &JobScope) -> Result<Vec<Film>, DbError> {
        self.db.select_films_missing_poster(row_filter(scope)).await
    }

    async fn process(&self, film: &Film) -> Result<RowOutcome, JobAbort> {
        let resolution = self
            .resolver
            .resolve(&film_query(film))
            .await
            .map_err(quota_abort)?;

        match resolution {
            Resolution::Found { value, provider } => {
                debug!("Poster for '{}' from {}: {}", film.title, provider, value.url);
                Ok(write_outcome(
                    self.db
                        .update_film_poster(&film.id, &value.url, value.tmdb_id, value.imdb_id.as_deref())
                        .await,
                ))
            }
            not_found => Ok(RowOutcome::Failed(not_found.failure_summary())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Answer, StaticProbe, TitleProvider, create_test_db};
    use leafnode_core::{EnrichmentJob, ImageValidator, Provider, ProviderError};
    use leafnode_db::NewFilm;
    use std::time::Duration;

    fn poster(url: &str, tmdb_id: Option<i64>, imdb_id: Option<&str>) -> PosterCandidate {
        PosterCandidate {
            url: url.to_string(),
            tmdb_id,
            imdb_id: imdb_id.map(|s| s.to_string()),
        }
    }

    fn new_film(title: &str) -> NewFilm {
        NewFilm {
            title: title.to_string(),
            release_year: Some(1980),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_three_film_batch() {
        let (db, _dir) = create_test_db().await;
        let a = db.insert_film(new_film("Stalker")).await.unwrap();
        let b = db.insert_film(new_film("Mirror")).await.unwrap();
        let c = db.insert_film(new_film("Solaris")).await.unwrap();

        let tmdb = Arc::new(
            TitleProvider::new("tmdb")
                .with(
                    "Stalker",
                    Answer::Value(poster("https://image.tmdb.org/t/p/w500/stalker.jpg", Some(1398), None)),
                )
                .with("Mirror", Answer::Hang(Duration::from_secs(1)))
                .with(
                    "Solaris",
                    Answer::Value(poster("https://image.tmdb.org/t/p/w500/solaris.jpg", Some(593), None)),
                ),
        );
        let omdb = Arc::new(TitleProvider::new("omdb").with(
            "Solaris",
            Answer::Value(poster("https://m.media-amazon.com/solaris.jpg", None, Some("tt0069293"))),
        ));
        let probe = StaticProbe::default()
            .image("https://image.tmdb.org/t/p/w500/stalker.jpg", 45000)
            .head("https://image.tmdb.org/t/p/w500/solaris.jpg", 200, "text/html")
            .image("https://m.media-amazon.com/solaris.jpg", 45000);

        let chain: Vec<Arc<dyn Provider<FilmQuery, PosterCandidate>>> = vec![tmdb, omdb];
        let resolver = Resolver::new(chain)
            .with_validator(Arc::new(ImageValidator::new(Arc::new(probe))))
            .with_timeout(Duration::from_millis(50));
        let task = FilmPosterTask::new(db.clone(), Arc::new(resolver));

        let summary = EnrichmentJob::new(Duration::ZERO)
            .run(&task, &JobScope::backlog(20))
            .await
            .unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.aborted);
        assert!(summary.errors[0].starts_with("Mirror"));

        let stored = db.get_film(&a.id).await.unwrap().unwrap();
        assert_eq!(
            stored.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/stalker.jpg")
        );
        assert_eq!(stored.tmdb_id, Some(1398));

        let stored = db.get_film(&b.id).await.unwrap().unwrap();
        assert!(stored.poster_url.is_none());

        let stored = db.get_film(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.poster_url.as_deref(), Some("https://m.media-amazon.com/solaris.jpg"));
        assert_eq!(stored.imdb_id.as_deref(), Some("tt0069293"));
        assert!(stored.tmdb_id.is_none());
    }

    #[tokio::test]
    async fn test_failing_row_does_not_stop_batch() {
        let (db, _dir) = create_test_db().await;
        db.insert_film(new_film("Mirror")).await.unwrap();
        let later = db.insert_film(new_film("Stalker")).await.unwrap();

        let tmdb = Arc::new(
            TitleProvider::new("tmdb")
                .with(
                    "Mirror",
                    Answer::Fail(ProviderError::Upstream {
                        status: 500,
                        message: "internal".to_string(),
                    }),
                )
                .with(
                    "Stalker",
                    Answer::Value(poster("https://image.tmdb.org/t/p/w500/stalker.jpg", Some(1398), None)),
                ),
        );
        let chain: Vec<Arc<dyn Provider<FilmQuery, PosterCandidate>>> = vec![tmdb];
        let task = FilmPosterTask::new(db.clone(), Arc::new(Resolver::new(chain)));

        let summary = EnrichmentJob::new(Duration::ZERO)
            .run(&task, &JobScope::backlog(20))
            .await
            .unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert!(db.get_film(&later.id).await.unwrap().unwrap().poster_url.is_some());
    }

    #[tokio::test]
    async fn test_scoped_run_only_touches_listed_films() {
        let (db, _dir) = create_test_db().await;
        let a = db.insert_film(new_film("Stalker")).await.unwrap();
        let b = db.insert_film(new_film("Solaris")).await.unwrap();

        let tmdb = Arc::new(
            TitleProvider::new("tmdb")
                .with(
                    "Stalker",
                    Answer::Value(poster("https://image.tmdb.org/t/p/w500/stalker.jpg", None, None)),
                )
                .with(
                    "Solaris",
                    Answer::Value(poster("https://image.tmdb.org/t/p/w500/solaris.jpg", None, None)),
                ),
        );
        let chain: Vec<Arc<dyn Provider<FilmQuery, PosterCandidate>>> = vec![tmdb];
        let task = FilmPosterTask::new(db.clone(), Arc::new(Resolver::new(chain)));

        let summary = EnrichmentJob::new(Duration::ZERO)
            .run(&task, &JobScope::for_ids(vec![b.id.clone()], 20))
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert!(db.get_film(&a.id).await.unwrap().unwrap().poster_url.is_none());
        assert!(db.get_film(&b.id).await.unwrap().unwrap().poster_url.is_some());
    }
}
