//! services/api/src/web/profile.rs
//!
//! Reading statistics and the home dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use booktracker_core::domain::User;
use chrono::{Datelike, Utc};
use std::sync::Arc;

use crate::web::rest::port_error;
use crate::web::schemas::{DashboardResponse, ProfileStatsResponse, YearQuery};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/profile/stats",
    params(YearQuery),
    responses((status = 200, description = "Reading statistics", body = ProfileStatsResponse))
)]
pub async fn profile_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<YearQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    let stats = state
        .tracker
        .profile_stats(user.user_id, year)
        .await
        .map_err(|e| port_error("Failed to compute profile stats", e))?;
    Ok(Json(ProfileStatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/home",
    responses((status = 200, description = "Current books, next challenge and counts", body = DashboardResponse))
)]
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let dashboard = state
        .tracker
        .dashboard(user.user_id)
        .await
        .map_err(|e| port_error("Failed to load dashboard", e))?;
    Ok(Json(DashboardResponse::from(dashboard)))
}
