//! Database models

use crate::utils::{parse_datetime_or_now, parse_optional_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Reader,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Reader => "reader",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "reader" => Ok(UserRole::Reader),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// A book ("transmission") in the library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub cover_url: Option<String>,
    pub google_books_id: Option<String>,
    pub cover_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New book for insertion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub cover_url: Option<String>,
}

/// A film adaptation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Film {
    pub id: String,
    pub book_id: Option<String>,
    pub title: String,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub trailer_url: Option<String>,
    pub criterion_url: Option<String>,
    pub is_criterion_collection: bool,
    pub poster_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New film for insertion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFilm {
    pub book_id: Option<String>,
    pub title: String,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub is_criterion_collection: bool,
}

/// One recorded execution of an enrichment job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRun {
    pub id: i64,
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub aborted: bool,
    pub errors: Vec<String>,
    /// Run was restricted to explicit row ids
    pub scoped: bool,
}

/// New enrichment run for insertion
#[derive(Debug, Clone)]
pub struct NewEnrichmentRun {
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub aborted: bool,
    pub errors: Vec<String>,
    pub scoped: bool,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::Reader),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Book {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            isbn: row.try_get("isbn")?,
            publication_year: row.try_get("publication_year")?,
            cover_url: row.try_get("cover_url")?,
            google_books_id: row.try_get("google_books_id")?,
            cover_checked_at: parse_optional_datetime(row.try_get("cover_checked_at")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Film {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Film {
            id: row.try_get("id")?,
            book_id: row.try_get("book_id")?,
            title: row.try_get("title")?,
            director: row.try_get("director")?,
            release_year: row.try_get("release_year")?,
            poster_url: row.try_get("poster_url")?,
            tmdb_id: row.try_get("tmdb_id")?,
            imdb_id: row.try_get("imdb_id")?,
            trailer_url: row.try_get("trailer_url")?,
            criterion_url: row.try_get("criterion_url")?,
            is_criterion_collection: row.try_get("is_criterion_collection")?,
            poster_checked_at: parse_optional_datetime(row.try_get("poster_checked_at")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for EnrichmentRun {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let errors: String = row.try_get("errors")?;
        Ok(EnrichmentRun {
            id: row.try_get("id")?,
            job: row.try_get("job")?,
            started_at: parse_datetime_or_now(&row.try_get::<String, _>("started_at")?),
            finished_at: parse_datetime_or_now(&row.try_get::<String, _>("finished_at")?),
            processed: row.try_get("processed")?,
            successful: row.try_get("successful")?,
            failed: row.try_get("failed")?,
            skipped: row.try_get("skipped")?,
            aborted: row.try_get("aborted")?,
            errors: serde_json::from_str(&errors).unwrap_or_default(),
            scoped: row.try_get("scoped")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Admin, UserRole::Reader] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_str("superuser").is_err());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Reader.is_admin());
    }
}
