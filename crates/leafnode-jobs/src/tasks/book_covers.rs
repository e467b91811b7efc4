//! Cover images for books

use async_trait::async_trait;
use leafnode_core::{EnrichmentTask, JobAbort, JobScope, Resolution, Resolver, RowOutcome};
use leafnode_db::{Book, Database, DbError};
use leafnode_providers::{BookQuery, CoverCandidate};
use std::sync::Arc;
use tracing::debug;

use super::{book_query, quota_abort, row_filter, write_outcome};
use crate::kind::JobKind;

/// Fills `cover_url` on books that have none
pub struct BookCoverTask {
    db: Database,
    resolver: Arc<Resolver<BookQuery, CoverCandidate>>,
}

impl BookCoverTask {
    pub fn new(db: Database, resolver: Arc<Resolver<BookQuery, CoverCandidate>>) -> Self {
        Self { db, resolver }
    }
}

#[async_trait]
impl EnrichmentTask for BookCoverTask {
    type Row = Book;
    type Error = DbError;

    fn name(&self) -> &'static str {
        JobKind::EnrichBookCovers.as_str()
    }

    fn describe(&self, book: &Book) -> String {
        format!("{} ({})", book.title, book.id)
    }

    async fn select(&self, scope: &JobScope) -> Result<Vec<Book>, DbError> {
        self.db.select_books_missing_cover(row_filter(scope)).await
    }

    async fn process(&self, book: &Book) -> Result<RowOutcome, JobAbort> {
        let resolution = self
            .resolver
            .resolve(&book_query(book))
            .await
            .map_err(quota_abort)?;

        match resolution {
            Resolution::Found { value, provider } => {
                debug!("Cover for '{}' from {}: {}", book.title, provider, value.url);
                Ok(write_outcome(
                    self.db
                        .update_book_cover(&book.id, &value.url, value.google_books_id.as_deref())
                        .await,
                ))
            }
            not_found => Ok(RowOutcome::Failed(not_found.failure_summary())),
        }
    }
}
