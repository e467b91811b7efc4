//! Periodic re-check of stored cover and poster images

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leafnode_core::{EnrichmentTask, ImageCheck, ImageValidator, JobAbort, JobScope, RowOutcome};
use leafnode_db::{Book, Database, DbError, Film};
use tracing::{debug, info};

use super::{row_filter, write_outcome};
use crate::kind::JobKind;

/// A row whose stored image is due for a check
#[derive(Debug, Clone)]
pub enum SweepTarget {
    Book(Book),
    Film(Film),
}

impl SweepTarget {
    fn id(&self) -> &str {
        match self {
            SweepTarget::Book(book) => &book.id,
            SweepTarget::Film(film) => &film.id,
        }
    }

    fn image_url(&self) -> Option<&str> {
        match self {
            SweepTarget::Book(book) => book.cover_url.as_deref(),
            SweepTarget::Film(film) => film.poster_url.as_deref(),
        }
    }

    fn checked_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SweepTarget::Book(book) => book.cover_checked_at,
            SweepTarget::Film(film) => film.poster_checked_at,
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        match self {
            SweepTarget::Book(book) => book.created_at,
            SweepTarget::Film(film) => film.created_at,
        }
    }
}

/// Re-validates stored images, clearing broken ones so the enrichment
/// jobs pick the rows up again
pub struct ImageSweepTask {
    db: Database,
    validator: ImageValidator,
}

impl ImageSweepTask {
    pub fn new(db: Database, validator: ImageValidator) -> Self {
        Self { db, validator }
    }

    async fn mark_checked(&self, target: &SweepTarget) -> Result<bool, DbError> {
        match target {
            SweepTarget::Book(book) => self.db.mark_book_cover_checked(&book.id).await,
            SweepTarget::Film(film) => self.db.mark_film_poster_checked(&film.id).await,
        }
    }

    async fn clear(&self, target: &SweepTarget) -> Result<bool, DbError> {
        match target {
            SweepTarget::Book(book) => self.db.clear_book_cover(&book.id).await,
            SweepTarget::Film(film) => self.db.clear_film_poster(&film.id).await,
        }
    }
}

#[async_trait]
impl EnrichmentTask for ImageSweepTask {
    type Row = SweepTarget;
    type Error = DbError;

    fn name(&self) -> &'static str {
        JobKind::ValidateImages.as_str()
    }

    fn describe(&self, target: &SweepTarget) -> String {
        match target {
            SweepTarget::Book(book) => format!("book {} ({})", book.title, book.id),
            SweepTarget::Film(film) => format!("film {} ({})", film.title, film.id),
        }
    }

    /// Books and films together, never-checked rows first, then the
    /// least recently checked
    async fn select(&self, scope: &JobScope) -> Result<Vec<SweepTarget>, DbError> {
        let filter = row_filter(scope);
        let books = self.db.select_books_for_cover_check(filter).await?;
        let films = self.db.select_films_for_poster_check(filter).await?;

        let mut targets: Vec<SweepTarget> = books
            .into_iter()
            .map(SweepTarget::Book)
            .chain(films.into_iter().map(SweepTarget::Film))
            .collect();
        targets.sort_by_key(|t| (t.checked_at().is_some(), t.checked_at(), t.created_at()));
        targets.truncate(scope.limit);
        Ok(targets)
    }

    async fn process(&self, target: &SweepTarget) -> Result<RowOutcome, JobAbort> {
        let Some(url) = target.image_url() else {
            return Ok(RowOutcome::Unchanged);
        };

        match self.validator.check(url).await {
            ImageCheck::Valid => match self.mark_checked(target).await {
                Ok(true) => Ok(RowOutcome::Unchanged),
                other => Ok(write_outcome(other)),
            },
            ImageCheck::Broken(reason) => {
                info!("Clearing broken image on {}: {}", target.id(), reason);
                Ok(write_outcome(self.clear(target).await))
            }
            // Stamped so a dead host cannot keep other rows out of the batch
            ImageCheck::Unreachable(reason) => {
                debug!("Image for {} unreachable, keeping it: {}", target.id(), reason);
                match self.mark_checked(target).await {
                    Ok(true) => Ok(RowOutcome::Failed(format!("unreachable: {}", reason))),
                    other => Ok(write_outcome(other)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticProbe, create_test_db};
    use leafnode_core::EnrichmentJob;
    use leafnode_db::{NewBook, NewFilm};
    use std::sync::Arc;
    use std::time::Duration;

    fn create_test_task(db: &Database, probe: StaticProbe) -> ImageSweepTask {
        ImageSweepTask::new(db.clone(), ImageValidator::new(Arc::new(probe)))
    }

    #[tokio::test]
    async fn test_sweep_outcomes() {
        let (db, _dir) = create_test_db().await;
        let book = db
            .insert_book(NewBook {
                title: "Roadside Picnic".to_string(),
                cover_url: Some("https://covers/ok.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let broken = db
            .insert_film(NewFilm {
                title: "Stalker".to_string(),
                poster_url: Some("https://posters/gone.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let offline = db
            .insert_film(NewFilm {
                title: "Solaris".to_string(),
                poster_url: Some("https://posters/offline.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        // Nothing stored, nothing to check
        db.insert_book(NewBook {
            title: "Hard to Be a God".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let probe = StaticProbe::default()
            .image("https://covers/ok.jpg", 45000)
            .head("https://posters/gone.jpg", 404, "text/html");
        let task = create_test_task(&db, probe);

        let summary = EnrichmentJob::new(Duration::ZERO)
            .run(&task, &JobScope::backlog(50))
            .await
            .unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);

        let stored = db.get_book(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.cover_url.as_deref(), Some("https://covers/ok.jpg"));
        assert!(stored.cover_checked_at.is_some());

        let stored = db.get_film(&broken.id).await.unwrap().unwrap();
        assert!(stored.poster_url.is_none());

        let stored = db.get_film(&offline.id).await.unwrap().unwrap();
        assert_eq!(stored.poster_url.as_deref(), Some("https://posters/offline.jpg"));
        assert!(stored.poster_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_rows_rotate_out_of_the_batch() {
        let (db, _dir) = create_test_db().await;
        for title in ["Stalker", "Solaris", "Mirror"] {
            db.insert_film(NewFilm {
                title: title.to_string(),
                poster_url: Some(format!("https://dead-host/{}.jpg", title)),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        let book = db
            .insert_book(NewBook {
                title: "Roadside Picnic".to_string(),
                cover_url: Some("https://covers/picnic.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let probe = StaticProbe::default().image("https://covers/picnic.jpg", 45000);
        let task = create_test_task(&db, probe);
        let job = EnrichmentJob::new(Duration::ZERO);

        let first = job.run(&task, &JobScope::backlog(2)).await.unwrap();
        assert_eq!(first.processed, 2);
        assert_eq!(first.failed, 2);

        job.run(&task, &JobScope::backlog(2)).await.unwrap();

        let stored = db.get_book(&book.id).await.unwrap().unwrap();
        assert!(stored.cover_checked_at.is_some());
        assert_eq!(stored.cover_url.as_deref(), Some("https://covers/picnic.jpg"));
    }

    #[tokio::test]
    async fn test_never_checked_rows_come_first() {
        let (db, _dir) = create_test_db().await;
        let checked = db
            .insert_film(NewFilm {
                title: "Stalker".to_string(),
                poster_url: Some("https://posters/stalker.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        db.mark_film_poster_checked(&checked.id).await.unwrap();
        let fresh = db
            .insert_book(NewBook {
                title: "Roadside Picnic".to_string(),
                cover_url: Some("https://covers/picnic.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let task = create_test_task(&db, StaticProbe::default());
        let targets = task.select(&JobScope::backlog(1)).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id(), fresh.id);
    }
}
