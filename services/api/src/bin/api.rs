//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, GoogleBooksAdapter},
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use booktracker_core::{CatalogSearch, ReadingTracker};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Catalog Adapter ---
    let catalog_adapter = GoogleBooksAdapter::new(
        &config.google_books_base_url,
        &config.google_books_api_key,
        config.catalog_timeout,
    )?;
    let catalog = CatalogSearch::new(Arc::new(catalog_adapter));
    info!("Catalog search using {}", config.google_books_base_url);

    // --- 4. Build the Shared AppState ---
    let tracker = ReadingTracker::new(db_adapter.clone(), catalog.clone());
    let app_state = Arc::new(AppState {
        db: db_adapter.clone(),
        accounts: db_adapter,
        config: config.clone(),
        catalog,
        tracker,
    });

    // --- 5. Create the Web Router ---
    let app = web::router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
