//! Enrichment tasks over the library tables
//!
//! Each task pairs a selection query with the resolver (or validator)
//! that fills the missing field in. The shared helpers below turn
//! repository and resolver results into per-row outcomes.

mod book_covers;
mod criterion_links;
mod film_posters;
mod image_sweep;
mod trailers;

pub use book_covers::BookCoverTask;
pub use criterion_links::CriterionLinkTask;
pub use film_posters::FilmPosterTask;
pub use image_sweep::{ImageSweepTask, SweepTarget};
pub use trailers::TrailerTask;

use leafnode_core::{JobAbort, JobScope, ResolveError, RowOutcome};
use leafnode_db::{Book, DbError, Film, RowFilter};
use leafnode_providers::{BookQuery, FilmQuery};
use tracing::error;

/// Repository filter for a job scope
pub(crate) fn row_filter(scope: &JobScope) -> RowFilter<'_> {
    let limit = i64::try_from(scope.limit).unwrap_or(i64::MAX);
    match &scope.ids {
        Some(ids) => RowFilter::for_ids(ids, limit),
        None => RowFilter::backlog(limit),
    }
}

/// Outcome of a single-row write
pub(crate) fn write_outcome(result: Result<bool, DbError>) -> RowOutcome {
    match result {
        Ok(true) => RowOutcome::Updated,
        Ok(false) => RowOutcome::Failed("row no longer exists".to_string()),
        Err(e) => {
            error!("Failed to write enrichment result: {}", e);
            RowOutcome::Failed(format!("database error: {}", e))
        }
    }
}

/// Quota exhaustion stops the rest of the batch
pub(crate) fn quota_abort(err: ResolveError) -> JobAbort {
    JobAbort::new(err.to_string())
}

pub(crate) fn book_query(book: &Book) -> BookQuery {
    BookQuery {
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
    }
}

pub(crate) fn film_query(film: &Film) -> FilmQuery {
    FilmQuery {
        title: film.title.clone(),
        year: film.release_year,
        director: film.director.clone(),
    }
}
