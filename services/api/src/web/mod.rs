pub mod auth;
pub mod books;
pub mod challenges;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod schemas;
pub mod state;

pub use middleware::require_auth;

use crate::config::ConfigError;
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router: public auth routes, session-protected
/// routes and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ConfigError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/books/search", get(books::search_handler))
        .route("/books/catalog/{external_id}", post(books::add_from_catalog_handler))
        .route(
            "/books",
            get(books::library_handler).post(books::add_manual_handler),
        )
        .route("/books/categories", get(books::categories_handler))
        .route(
            "/books/{id}",
            get(books::book_detail_handler).delete(books::delete_book_handler),
        )
        .route("/books/{id}/progress", put(books::update_progress_handler))
        .route("/books/{id}/review", put(books::review_handler))
        .route(
            "/challenges",
            get(challenges::list_challenges_handler).post(challenges::create_challenge_handler),
        )
        .route(
            "/challenges/{id}",
            get(challenges::challenge_detail_handler)
                .put(challenges::update_challenge_handler)
                .delete(challenges::delete_challenge_handler),
        )
        .route(
            "/challenges/{id}/books/{book_id}",
            post(challenges::add_challenge_book_handler)
                .delete(challenges::remove_challenge_book_handler),
        )
        .route("/profile/stats", get(profile::profile_stats_handler))
        .route("/home", get(profile::home_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi())))
}
