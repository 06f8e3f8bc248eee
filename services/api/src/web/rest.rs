//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the mapping from
//! port errors to HTTP responses shared by every REST handler.

use axum::http::StatusCode;
use booktracker_core::ports::PortError;
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::web::{auth, books, challenges, profile, schemas};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        books::search_handler,
        books::add_from_catalog_handler,
        books::add_manual_handler,
        books::library_handler,
        books::categories_handler,
        books::book_detail_handler,
        books::delete_book_handler,
        books::update_progress_handler,
        books::review_handler,
        challenges::list_challenges_handler,
        challenges::create_challenge_handler,
        challenges::challenge_detail_handler,
        challenges::update_challenge_handler,
        challenges::delete_challenge_handler,
        challenges::add_challenge_book_handler,
        challenges::remove_challenge_book_handler,
        profile::profile_stats_handler,
        profile::home_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            schemas::NewBookRequest,
            schemas::ProgressUpdateRequest,
            schemas::ReviewRequest,
            schemas::ChallengeRequest,
            schemas::CatalogEntryResponse,
            schemas::BookResponse,
            schemas::ProgressResponse,
            schemas::LibraryItemResponse,
            schemas::AddedBookResponse,
            schemas::ReviewResponse,
            schemas::BookDetailResponse,
            schemas::StatsResponse,
            schemas::ChallengeResponse,
            schemas::ChallengeOverviewResponse,
            schemas::ChallengeListResponse,
            schemas::LinkedBookResponse,
            schemas::ChallengeDetailResponse,
            schemas::MembershipResponse,
            schemas::FinishedBookResponse,
            schemas::MonthCountResponse,
            schemas::ProfileStatsResponse,
            schemas::DashboardResponse,
        )
    ),
    tags(
        (name = "Book Tracker API", description = "Catalog search, personal library, reading progress and reading challenges.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Converts a port error into the handler error tuple, logging it under `context`.
pub fn port_error(context: &str, e: PortError) -> (StatusCode, String) {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("{}: {:?}", context, e);
        let message = match e {
            PortError::Unavailable(_) => "Upstream service unavailable",
            _ => "Internal server error",
        };
        return (status, message.to_string());
    }

    warn!("{}: {:?}", context, e);
    let message = match e {
        PortError::NotFound(msg) | PortError::Conflict(msg) | PortError::Invalid(msg) => msg,
        other => other.to_string(),
    };
    (status, message)
}

fn status_for(e: &PortError) -> StatusCode {
    match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Conflict(_) => StatusCode::CONFLICT,
        PortError::Invalid(_) => StatusCode::BAD_REQUEST,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
