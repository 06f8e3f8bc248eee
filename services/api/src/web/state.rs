//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use booktracker_core::ports::{AccountDirectory, DatabaseService};
use booktracker_core::{CatalogSearch, ReadingTracker};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    /// Resolves the account behind a validated session.
    pub accounts: Arc<dyn AccountDirectory>,
    pub config: Arc<Config>,
    pub catalog: CatalogSearch,
    pub tracker: ReadingTracker,
}
