//! Book operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Book, NewBook};
use crate::repository::{Database, RowFilter};
use crate::utils::format_timestamp;

const BOOK_COLUMNS: &str = "id, title, author, isbn, publication_year, cover_url, google_books_id, cover_checked_at, created_at, updated_at";

impl Database {
    /// Insert a new book
    pub async fn insert_book(&self, book: NewBook) -> Result<Book, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, publication_year, cover_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(&book.cover_url)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(Book {
            id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            publication_year: book.publication_year,
            cover_url: book.cover_url,
            google_books_id: None,
            cover_checked_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: &str) -> Result<Option<Book>, DbError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Book::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List books, newest first
    pub async fn list_books(&self, limit: i64, offset: i64) -> Result<Vec<Book>, DbError> {
        let sql = format!(
            "SELECT {} FROM books ORDER BY created_at DESC LIMIT ? OFFSET ?",
            BOOK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Book::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Enrichment Selection ====================

    /// Books with no cover, oldest first
    pub async fn select_books_missing_cover(&self, filter: RowFilter<'_>) -> Result<Vec<Book>, DbError> {
        self.select_filtered(
            "books",
            BOOK_COLUMNS,
            "cover_url IS NULL OR cover_url = ''",
            "created_at ASC, rowid ASC",
            filter,
        )
        .await
    }

    /// Books with a cover, least recently checked first
    pub async fn select_books_for_cover_check(&self, filter: RowFilter<'_>) -> Result<Vec<Book>, DbError> {
        self.select_filtered(
            "books",
            BOOK_COLUMNS,
            "cover_url IS NOT NULL AND cover_url != ''",
            "cover_checked_at IS NOT NULL, cover_checked_at ASC, created_at ASC",
            filter,
        )
        .await
    }

    // ==================== Enrichment Updates ====================

    /// Write a found cover; `google_books_id` is kept when not supplied
    pub async fn update_book_cover(
        &self,
        id: &str,
        cover_url: &str,
        google_books_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE books
            SET cover_url = ?, google_books_id = COALESCE(?, google_books_id), cover_checked_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(cover_url)
        .bind(google_books_id)
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that the stored cover was checked and is fine
    pub async fn mark_book_cover_checked(&self, id: &str) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query("UPDATE books SET cover_checked_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a broken cover so the cover job picks the book up again
    pub async fn clear_book_cover(&self, id: &str) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE books
            SET cover_url = NULL, cover_checked_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
