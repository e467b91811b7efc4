//! Film operations

use chrono::Utc;
use leafnode_core::matching::CRITERION_SEARCH_PREFIX;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Film, NewFilm};
use crate::repository::{Database, RowFilter};
use crate::utils::format_timestamp;

const FILM_COLUMNS: &str = "id, book_id, title, director, release_year, poster_url, tmdb_id, imdb_id, trailer_url, criterion_url, is_criterion_collection, poster_checked_at, created_at, updated_at";

impl Database {
    /// Insert a new film
    pub async fn insert_film(&self, film: NewFilm) -> Result<Film, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO films (id, book_id, title, director, release_year, poster_url, trailer_url, is_criterion_collection, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&film.book_id)
        .bind(&film.title)
        .bind(&film.director)
        .bind(film.release_year)
        .bind(&film.poster_url)
        .bind(&film.trailer_url)
        .bind(film.is_criterion_collection)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(Film {
            id,
            book_id: film.book_id,
            title: film.title,
            director: film.director,
            release_year: film.release_year,
            poster_url: film.poster_url,
            tmdb_id: None,
            imdb_id: None,
            trailer_url: film.trailer_url,
            criterion_url: None,
            is_criterion_collection: film.is_criterion_collection,
            poster_checked_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a film by ID
    pub async fn get_film(&self, id: &str) -> Result<Option<Film>, DbError> {
        let sql = format!("SELECT {} FROM films WHERE id = ?", FILM_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Film::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List films, newest first
    pub async fn list_films(&self, limit: i64, offset: i64) -> Result<Vec<Film>, DbError> {
        let sql = format!(
            "SELECT {} FROM films ORDER BY created_at DESC LIMIT ? OFFSET ?",
            FILM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Film::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Enrichment Selection ====================

    pub async fn select_films_missing_poster(&self, filter: RowFilter<'_>) -> Result<Vec<Film>, DbError> {
        self.select_filtered(
            "films",
            FILM_COLUMNS,
            "poster_url IS NULL OR poster_url = ''",
            "created_at ASC, rowid ASC",
            filter,
        )
        .await
    }

    pub async fn select_films_missing_trailer(&self, filter: RowFilter<'_>) -> Result<Vec<Film>, DbError> {
        self.select_filtered(
            "films",
            FILM_COLUMNS,
            "trailer_url IS NULL OR trailer_url = ''",
            "created_at ASC, rowid ASC",
            filter,
        )
        .await
    }

    /// Films whose Criterion link needs attention: flagged without a film
    /// page, or unflagged but still carrying a link
    pub async fn select_films_for_criterion(&self, filter: RowFilter<'_>) -> Result<Vec<Film>, DbError> {
        let condition = format!(
            "(is_criterion_collection = 1 AND (criterion_url IS NULL OR criterion_url = '' OR criterion_url LIKE '{}%')) \
             OR (is_criterion_collection = 0 AND criterion_url IS NOT NULL AND criterion_url != '')",
            CRITERION_SEARCH_PREFIX
        );
        self.select_filtered("films", FILM_COLUMNS, &condition, "created_at ASC, rowid ASC", filter)
            .await
    }

    /// Films with a poster, least recently checked first
    pub async fn select_films_for_poster_check(&self, filter: RowFilter<'_>) -> Result<Vec<Film>, DbError> {
        self.select_filtered(
            "films",
            FILM_COLUMNS,
            "poster_url IS NOT NULL AND poster_url != ''",
            "poster_checked_at IS NOT NULL, poster_checked_at ASC, created_at ASC",
            filter,
        )
        .await
    }

    // ==================== Enrichment Updates ====================

    /// Write a found poster; external ids are kept when not supplied
    pub async fn update_film_poster(
        &self,
        id: &str,
        poster_url: &str,
        tmdb_id: Option<i64>,
        imdb_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE films
            SET poster_url = ?, tmdb_id = COALESCE(?, tmdb_id), imdb_id = COALESCE(?, imdb_id),
                poster_checked_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(poster_url)
        .bind(tmdb_id)
        .bind(imdb_id)
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_film_trailer(&self, id: &str, trailer_url: &str) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query("UPDATE films SET trailer_url = ?, updated_at = ? WHERE id = ?")
            .bind(trailer_url)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the Criterion link, or remove it with `None`
    pub async fn set_film_criterion_url(&self, id: &str, criterion_url: Option<&str>) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query("UPDATE films SET criterion_url = ?, updated_at = ? WHERE id = ?")
            .bind(criterion_url)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_film_poster_checked(&self, id: &str) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query("UPDATE films SET poster_checked_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a broken poster so the poster job picks the film up again
    pub async fn clear_film_poster(&self, id: &str) -> Result<bool, DbError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE films
            SET poster_url = NULL, poster_checked_at = ?, updated_at = ?
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

#[cfg(test)]
mod tests {
    use crate::models::NewFilm;
    use crate::repository::RowFilter;
    use crate::repository::test_support::create_test_db;

    fn new_film(title: &str) -> NewFilm {
        NewFilm {
            title: title.to_string(),
            release_year: Some(2016),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_poster_update_keeps_known_ids() {
        let (db, _dir) = create_test_db().await;
        let film = db.insert_film(new_film("Arrival")).await.unwrap();

        db.update_film_poster(&film.id, "https://image.tmdb.org/t/p/w500/a.jpg", Some(329865), None)
            .await
            .unwrap();
        db.update_film_poster(&film.id, "https://img/omdb.jpg", None, Some("tt2543164"))
            .await
            .unwrap();

        let stored = db.get_film(&film.id).await.unwrap().unwrap();
        assert_eq!(stored.poster_url.as_deref(), Some("https://img/omdb.jpg"));
        assert_eq!(stored.tmdb_id, Some(329865));
        assert_eq!(stored.imdb_id.as_deref(), Some("tt2543164"));
        // Other fields are untouched
        assert_eq!(stored.trailer_url, None);
        assert_eq!(stored.release_year, Some(2016));
    }

    #[tokio::test]
    async fn test_trailer_selection() {
        let (db, _dir) = create_test_db().await;
        let a = db.insert_film(new_film("Arrival")).await.unwrap();
        let b = db.insert_film(new_film("Annihilation")).await.unwrap();

        db.update_film_trailer(&a.id, "https://www.youtube.com/watch?v=x")
            .await
            .unwrap();

        let missing = db.select_films_missing_trailer(RowFilter::backlog(10)).await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, b.id);
    }

    #[tokio::test]
    async fn test_criterion_selection() {
        let (db, _dir) = create_test_db().await;
        let flagged = db
            .insert_film(NewFilm {
                is_criterion_collection: true,
                ..new_film("Solaris")
            })
            .await
            .unwrap();
        let searched = db
            .insert_film(NewFilm {
                is_criterion_collection: true,
                ..new_film("Alphaville")
            })
            .await
            .unwrap();
        let verified = db
            .insert_film(NewFilm {
                is_criterion_collection: true,
                ..new_film("Stalker")
            })
            .await
            .unwrap();
        let stale = db.insert_film(new_film("Arrival")).await.unwrap();
        db.insert_film(new_film("Annihilation")).await.unwrap();

        db.set_film_criterion_url(&searched.id, Some("https://www.criterion.com/search#stq=Alphaville"))
            .await
            .unwrap();
        db.set_film_criterion_url(&verified.id, Some("https://www.criterion.com/films/stalker"))
            .await
            .unwrap();
        db.set_film_criterion_url(&stale.id, Some("https://www.criterion.com/search#stq=Arrival"))
            .await
            .unwrap();

        let selected = db.select_films_for_criterion(RowFilter::backlog(10)).await.unwrap();
        let ids: Vec<_> = selected.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids, vec![flagged.id, searched.id, stale.id]);
    }

    #[tokio::test]
    async fn test_poster_sweep_clear() {
        let (db, _dir) = create_test_db().await;
        let film = db
            .insert_film(NewFilm {
                poster_url: Some("https://img/broken.jpg".to_string()),
                ..new_film("Arrival")
            })
            .await
            .unwrap();

        let due = db.select_films_for_poster_check(RowFilter::backlog(10)).await.unwrap();
        assert_eq!(due.len(), 1);

        db.clear_film_poster(&film.id).await.unwrap();
        assert!(db.select_films_for_poster_check(RowFilter::backlog(10)).await.unwrap().is_empty());
        assert_eq!(
            db.select_films_missing_poster(RowFilter::backlog(10)).await.unwrap().len(),
            1
        );
    }
}
