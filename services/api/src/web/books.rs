//! services/api/src/web/books.rs
//!
//! Catalog search and personal library endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use booktracker_core::domain::{NewBook, User};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::web::rest::port_error;
use crate::web::schemas::{
    AddedBookResponse, BookDetailResponse, BookResponse, CatalogEntryResponse,
    LibraryItemResponse, LibraryQuery, NewBookRequest, ProgressResponse, ProgressUpdateRequest,
    ReviewRequest, ReviewResponse, SearchQuery,
};
use crate::web::state::AppState;

type HandlerResult<T> = Result<T, (StatusCode, String)>;

/// Search the external catalog, best matches first.
///
/// Catalog failures are reported as an empty result list.
#[utoipa::path(
    get,
    path = "/books/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Scored catalog entries", body = [CatalogEntryResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<SearchQuery>,
) -> impl IntoResponse {
    let results: Vec<CatalogEntryResponse> = state
        .catalog
        .search(&params.query)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    info!("User {} searched '{}': {} results", user.user_id, params.query, results.len());
    Json(results)
}

/// Add a catalog volume to the library.
#[utoipa::path(
    post,
    path = "/books/catalog/{external_id}",
    params(("external_id" = String, Path, description = "Catalog volume identifier.")),
    responses(
        (status = 201, description = "Book added", body = AddedBookResponse),
        (status = 200, description = "Book was already in the library", body = AddedBookResponse),
        (status = 404, description = "Unknown catalog volume"),
        (status = 503, description = "Catalog unavailable")
    )
)]
pub async fn add_from_catalog_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(external_id): Path<String>,
) -> HandlerResult<impl IntoResponse> {
    let added = state
        .tracker
        .add_from_catalog(user.user_id, &external_id)
        .await
        .map_err(|e| port_error("Failed to add catalog book", e))?;

    let status = if added.already_present {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(AddedBookResponse::from(added))))
}

/// Add a book by hand.
#[utoipa::path(
    post,
    path = "/books",
    request_body = NewBookRequest,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid book details")
    )
)]
pub async fn add_manual_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<NewBookRequest>,
) -> HandlerResult<impl IntoResponse> {
    let book = state
        .tracker
        .add_manual(user.user_id, NewBook::from(req))
        .await
        .map_err(|e| port_error("Failed to add book", e))?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// List the library, optionally filtered.
#[utoipa::path(
    get,
    path = "/books",
    params(LibraryQuery),
    responses(
        (status = 200, description = "Library entries, most recently updated first", body = [LibraryItemResponse]),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn library_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<LibraryQuery>,
) -> HandlerResult<impl IntoResponse> {
    let filter = params
        .into_filter()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let items: Vec<LibraryItemResponse> = state
        .tracker
        .library(user.user_id, &filter)
        .await
        .map_err(|e| port_error("Failed to list library", e))?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/books/categories",
    responses((status = 200, description = "Distinct categories in the library, sorted", body = [String]))
)]
pub async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> HandlerResult<impl IntoResponse> {
    let categories = state
        .tracker
        .library_categories(user.user_id)
        .await
        .map_err(|e| port_error("Failed to list categories", e))?;
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Library book id.")),
    responses(
        (status = 200, description = "Book with progress and reviews", body = BookDetailResponse),
        (status = 404, description = "Not in the library")
    )
)]
pub async fn book_detail_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(book_id): Path<Uuid>,
) -> HandlerResult<impl IntoResponse> {
    let detail = state
        .tracker
        .book_detail(user.user_id, book_id)
        .await
        .map_err(|e| port_error("Failed to load book", e))?;
    Ok(Json(BookDetailResponse::from(detail)))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Library book id.")),
    responses(
        (status = 204, description = "Book removed with its progress, reviews and challenge links"),
        (status = 404, description = "Not in the library")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(book_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    state
        .tracker
        .delete_book(user.user_id, book_id)
        .await
        .map_err(|e| port_error("Failed to delete book", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change reading status and/or progress. Status is applied first.
#[utoipa::path(
    put,
    path = "/books/{id}/progress",
    params(("id" = Uuid, Path, description = "Library book id.")),
    request_body = ProgressUpdateRequest,
    responses(
        (status = 200, description = "Updated progress", body = ProgressResponse),
        (status = 400, description = "Invalid status, type or value"),
        (status = 404, description = "Not in the library")
    )
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ProgressUpdateRequest>,
) -> HandlerResult<impl IntoResponse> {
    let update = req
        .into_update()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let progress = state
        .tracker
        .update_reading(user.user_id, book_id, update)
        .await
        .map_err(|e| port_error("Failed to update progress", e))?;
    Ok(Json(ProgressResponse::from(progress)))
}

/// Create or replace the caller's review of a book.
#[utoipa::path(
    put,
    path = "/books/{id}/review",
    params(("id" = Uuid, Path, description = "Library book id.")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Stored review", body = ReviewResponse),
        (status = 400, description = "Rating outside 1 to 5"),
        (status = 404, description = "Not in the library")
    )
)]
pub async fn review_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> HandlerResult<impl IntoResponse> {
    let review = state
        .tracker
        .submit_review(user.user_id, book_id, req.rating, req.review_text)
        .await
        .map_err(|e| port_error("Failed to save review", e))?;
    Ok(Json(ReviewResponse::from(review)))
}
