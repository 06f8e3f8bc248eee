//! crates/booktracker_core/src/search.rs
//!
//! The catalog search component: queries the provider, normalizes every volume
//! and ranks the results by relevance.

use crate::domain::CatalogEntry;
use crate::ports::{CatalogProvider, PortResult};
use crate::relevance::relevance_score;
use std::sync::Arc;
use tracing::{info, warn};

/// Result-count cap sent with every search request.
pub const MAX_RESULTS: u32 = 40;

#[derive(Clone)]
pub struct CatalogSearch {
    provider: Arc<dyn CatalogProvider>,
}

impl CatalogSearch {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self { provider }
    }

    /// Returns entries matching `query`, most relevant first.
    ///
    /// Provider failures are logged and yield an empty list; no results is not an
    /// error. Entries with equal scores keep the provider's order.
    pub async fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let volumes = match self.provider.search_volumes(query, MAX_RESULTS).await {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!("Catalog search for {:?} failed: {}", query, e);
                return Vec::new();
            }
        };

        let mut entries: Vec<CatalogEntry> = volumes
            .into_iter()
            .map(|volume| {
                let mut entry = CatalogEntry::from(volume);
                entry.relevance_score = relevance_score(query, &entry);
                entry
            })
            .collect();
        entries.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        info!("Catalog search for {:?} returned {} entries", query, entries.len());
        entries
    }

    /// Fetches and normalizes a single volume for ingestion into a library.
    ///
    /// Unlike `search`, provider failures are returned to the caller.
    pub async fn lookup(&self, external_id: &str) -> PortResult<CatalogEntry> {
        let volume = self.provider.get_volume(external_id).await?;
        Ok(CatalogEntry::from(volume))
    }
}
