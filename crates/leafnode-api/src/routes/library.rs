//! Library routes: books and films

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use leafnode_db::{Book, Film, NewBook, NewFilm};
use leafnode_jobs::JobKind;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, RequireAuth};
use super::types::ListQuery;

const MAX_PAGE_SIZE: i64 = 200;
const MAX_TITLE_LENGTH: usize = 500;

fn page(query: &ListQuery) -> (i64, i64) {
    (query.limit.clamp(1, MAX_PAGE_SIZE), query.offset.max(0))
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    if title.trim().is_empty() {
        errors.push("title is required".to_string());
    } else if title.len() > MAX_TITLE_LENGTH {
        errors.push(format!("title exceeds {} characters", MAX_TITLE_LENGTH));
    }
}

fn check_year(field: &str, year: Option<i32>, errors: &mut Vec<String>) {
    if let Some(year) = year
        && !(0..=9999).contains(&year)
    {
        errors.push(format!("{} must be between 0 and 9999", field));
    }
}

fn validate_book(book: &NewBook) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_title(&book.title, &mut errors);
    check_year("publication_year", book.publication_year, &mut errors);
    if let Some(isbn) = &book.isbn
        && !isbn
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == 'X' || c == 'x' || c == ' ')
    {
        errors.push("isbn may only contain digits, hyphens and X".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }
    Err(ApiError::Validation {
        message: "Invalid book".to_string(),
        errors,
    })
}

fn validate_film(film: &NewFilm) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_title(&film.title, &mut errors);
    check_year("release_year", film.release_year, &mut errors);

    if errors.is_empty() {
        return Ok(());
    }
    Err(ApiError::Validation {
        message: "Invalid film".to_string(),
        errors,
    })
}

fn job_names<const N: usize>(kinds: [JobKind; N]) -> [&'static str; N] {
    kinds.map(|kind| kind.as_str())
}

// ==================== Book Routes ====================

/// GET /api/v1/books
async fn list_books(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let (limit, offset) = page(&query);
    Ok(Json(state.db.list_books(limit, offset).await?))
}

/// POST /api/v1/books (Admin only)
///
/// Starts cover enrichment for the new book without waiting for it.
async fn create_book(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    validate_book(&request)?;

    let book = state.db.insert_book(request).await?;
    info!("Added book: {} ({})", book.title, book.id);

    state
        .fanout
        .trigger(&job_names(JobKind::BOOK_SIBLINGS), vec![book.id.clone()]);

    Ok((StatusCode::CREATED, Json(book)))
}

// ==================== Film Routes ====================

/// GET /api/v1/films
async fn list_films(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Film>>, ApiError> {
    let (limit, offset) = page(&query);
    Ok(Json(state.db.list_films(limit, offset).await?))
}

/// POST /api/v1/films (Admin only)
///
/// Starts poster, trailer and Criterion enrichment for the new film
/// without waiting for them.
async fn create_film(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<NewFilm>,
) -> Result<(StatusCode, Json<Film>), ApiError> {
    validate_film(&request)?;

    if let Some(book_id) = &request.book_id
        && state.db.get_book(book_id).await?.is_none()
    {
        return Err(ApiError::BadRequest(format!("Unknown book: {}", book_id)));
    }

    let film = state.db.insert_film(request).await?;
    info!("Added film: {} ({})", film.title, film.id);

    state
        .fanout
        .trigger(&job_names(JobKind::FILM_SIBLINGS), vec![film.id.clone()]);

    Ok((StatusCode::CREATED, Json(film)))
}

/// Create library routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/books", get(list_books).post(create_book))
        .route("/api/v1/films", get(list_films).post(create_film))
}
