//! crates/booktracker_core/src/catalog.rs
//!
//! Raw volume metadata as returned by the catalog provider, and its
//! normalization into `CatalogEntry`.

use crate::domain::CatalogEntry;
use serde::Deserialize;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Longest cover URL that is kept as-is.
pub const MAX_COVER_URL_LEN: usize = 1000;

/// The body of a volume search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeList {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub published_date: Option<String>,
    pub categories: Option<Vec<String>>,
    pub page_count: Option<i32>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

impl ImageLinks {
    /// Picks the cover URL: the primary thumbnail, or the small one when the primary
    /// is missing or longer than `MAX_COVER_URL_LEN`. An over-long choice is dropped.
    pub fn cover_url(&self) -> Option<String> {
        let fits = |url: &&String| url.len() <= MAX_COVER_URL_LEN;
        match self.thumbnail.as_ref() {
            Some(primary) if fits(&primary) => Some(primary.clone()),
            _ => self.small_thumbnail.as_ref().filter(fits).cloned(),
        }
    }
}

impl From<Volume> for CatalogEntry {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        let cover_image = info.image_links.as_ref().and_then(ImageLinks::cover_url);
        let authors = match info.authors {
            Some(authors) if !authors.is_empty() => authors,
            _ => vec![UNKNOWN_AUTHOR.to_string()],
        };

        CatalogEntry {
            external_id: volume.id,
            title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            authors,
            description: info.description.unwrap_or_default(),
            average_rating: info.average_rating.unwrap_or_default(),
            published_date: info.published_date.unwrap_or_default(),
            categories: info.categories.unwrap_or_default(),
            page_count: info.page_count.unwrap_or_default(),
            cover_image,
            relevance_score: 0.0,
        }
    }
}
