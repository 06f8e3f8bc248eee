//! services/api/src/web/challenges.rs
//!
//! Reading challenge endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use booktracker_core::domain::User;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::rest::port_error;
use crate::web::schemas::{
    ChallengeDetailResponse, ChallengeListResponse, ChallengeRequest, ChallengeResponse,
    MembershipResponse,
};
use crate::web::state::AppState;

type HandlerResult<T> = Result<T, (StatusCode, String)>;

#[utoipa::path(
    get,
    path = "/challenges",
    responses((status = 200, description = "Active and completed challenges", body = ChallengeListResponse))
)]
pub async fn list_challenges_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> HandlerResult<impl IntoResponse> {
    let list = state
        .tracker
        .list_challenges(user.user_id)
        .await
        .map_err(|e| port_error("Failed to list challenges", e))?;
    Ok(Json(ChallengeListResponse::from(list)))
}

#[utoipa::path(
    post,
    path = "/challenges",
    request_body = ChallengeRequest,
    responses(
        (status = 201, description = "Challenge created", body = ChallengeResponse),
        (status = 400, description = "Invalid title, goal or end date")
    )
)]
pub async fn create_challenge_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<ChallengeRequest>,
) -> HandlerResult<impl IntoResponse> {
    let challenge = state
        .tracker
        .create_challenge(user.user_id, req.into())
        .await
        .map_err(|e| port_error("Failed to create challenge", e))?;
    Ok((StatusCode::CREATED, Json(ChallengeResponse::from(challenge))))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}",
    params(("id" = Uuid, Path, description = "Challenge id.")),
    responses(
        (status = 200, description = "Challenge with linked and candidate books", body = ChallengeDetailResponse),
        (status = 404, description = "Unknown challenge")
    )
)]
pub async fn challenge_detail_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(challenge_id): Path<Uuid>,
) -> HandlerResult<impl IntoResponse> {
    let detail = state
        .tracker
        .challenge_detail(user.user_id, challenge_id)
        .await
        .map_err(|e| port_error("Failed to load challenge", e))?;
    Ok(Json(ChallengeDetailResponse::from(detail)))
}

#[utoipa::path(
    put,
    path = "/challenges/{id}",
    params(("id" = Uuid, Path, description = "Challenge id.")),
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge updated", body = ChallengeResponse),
        (status = 404, description = "Unknown challenge"),
        (status = 409, description = "Challenge already completed")
    )
)]
pub async fn update_challenge_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(challenge_id): Path<Uuid>,
    Json(req): Json<ChallengeRequest>,
) -> HandlerResult<impl IntoResponse> {
    let challenge = state
        .tracker
        .update_challenge(user.user_id, challenge_id, req.into())
        .await
        .map_err(|e| port_error("Failed to update challenge", e))?;
    Ok(Json(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    delete,
    path = "/challenges/{id}",
    params(("id" = Uuid, Path, description = "Challenge id.")),
    responses(
        (status = 204, description = "Challenge deleted"),
        (status = 404, description = "Unknown challenge")
    )
)]
pub async fn delete_challenge_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(challenge_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    state
        .tracker
        .delete_challenge(user.user_id, challenge_id)
        .await
        .map_err(|e| port_error("Failed to delete challenge", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Count a finished book towards the challenge.
#[utoipa::path(
    post,
    path = "/challenges/{id}/books/{book_id}",
    params(
        ("id" = Uuid, Path, description = "Challenge id."),
        ("book_id" = Uuid, Path, description = "Library book id.")
    ),
    responses(
        (status = 200, description = "Link outcome and completion flag", body = MembershipResponse),
        (status = 400, description = "Book is not finished"),
        (status = 404, description = "Unknown challenge or book")
    )
)]
pub async fn add_challenge_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path((challenge_id, book_id)): Path<(Uuid, Uuid)>,
) -> HandlerResult<impl IntoResponse> {
    let outcome = state
        .tracker
        .add_book_to_challenge(user.user_id, challenge_id, book_id)
        .await
        .map_err(|e| port_error("Failed to add challenge book", e))?;
    Ok(Json(MembershipResponse::from(outcome)))
}

#[utoipa::path(
    delete,
    path = "/challenges/{id}/books/{book_id}",
    params(
        ("id" = Uuid, Path, description = "Challenge id."),
        ("book_id" = Uuid, Path, description = "Library book id.")
    ),
    responses(
        (status = 200, description = "Unlink outcome", body = MembershipResponse),
        (status = 404, description = "Unknown challenge or book")
    )
)]
pub async fn remove_challenge_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path((challenge_id, book_id)): Path<(Uuid, Uuid)>,
) -> HandlerResult<impl IntoResponse> {
    let outcome = state
        .tracker
        .remove_book_from_challenge(user.user_id, challenge_id, book_id)
        .await
        .map_err(|e| port_error("Failed to remove challenge book", e))?;
    Ok(Json(MembershipResponse::from(outcome)))
}
