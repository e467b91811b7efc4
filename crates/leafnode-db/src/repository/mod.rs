//! Database repository implementation

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use std::str::FromStr;
use tracing::info;

use crate::error::DbError;

// Submodules
mod books;
mod enrichment_runs;
mod films;
mod users;

/// Which rows a selection query may return
#[derive(Debug, Clone, Copy)]
pub struct RowFilter<'a> {
    /// Restrict to these primary keys
    pub ids: Option<&'a [String]>,
    /// Maximum number of rows
    pub limit: i64,
}

impl<'a> RowFilter<'a> {
    pub fn backlog(limit: i64) -> Self {
        Self { ids: None, limit }
    }

    pub fn for_ids(ids: &'a [String], limit: i64) -> Self {
        Self {
            ids: Some(ids),
            limit,
        }
    }

    /// An explicit but empty id list can never match
    fn matches_nothing(&self) -> bool {
        matches!(self.ids, Some(ids) if ids.is_empty()) || self.limit <= 0
    }

    fn id_clause(&self) -> String {
        match self.ids {
            Some(ids) => format!("AND id IN ({})", vec!["?"; ids.len()].join(", ")),
            None => String::new(),
        }
    }
}

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT,
                isbn TEXT,
                publication_year INTEGER,
                cover_url TEXT,
                google_books_id TEXT,
                cover_checked_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_books_created_at ON books(created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS films (
                id TEXT PRIMARY KEY,
                book_id TEXT REFERENCES books(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                director TEXT,
                release_year INTEGER,
                poster_url TEXT,
                tmdb_id INTEGER,
                imdb_id TEXT,
                trailer_url TEXT,
                criterion_url TEXT,
                is_criterion_collection INTEGER NOT NULL DEFAULT 0,
                poster_checked_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_films_created_at ON films(created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS enrichment_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                processed INTEGER NOT NULL,
                successful INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                aborted INTEGER NOT NULL,
                errors TEXT NOT NULL,
                scoped INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_enrichment_runs_started_at ON enrichment_runs(started_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Run a filtered selection against `table`.
    ///
    /// `condition` must not reference bind parameters; the id list and the
    /// limit are bound here.
    async fn select_filtered<T>(
        &self,
        table: &str,
        columns: &str,
        condition: &str,
        order_by: &str,
        filter: RowFilter<'_>,
    ) -> Result<Vec<T>, DbError>
    where
        T: for<'r> TryFrom<&'r SqliteRow, Error = sqlx::Error>,
    {
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE ({}) {} ORDER BY {} LIMIT ?",
            columns,
            table,
            condition,
            filter.id_clause(),
            order_by
        );

        let mut query = sqlx::query(&sql);
        if let Some(ids) = filter.ids {
            for id in ids {
                query = query.bind(id);
            }
        }
        query = query.bind(filter.limit);

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| T::try_from(row).map_err(DbError::from))
            .collect()
    }
}
