//! crates/booktracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format; the adapters
//! translate their own records into these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// Represents a user account - used throughout app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

//=========================================================================================
// Catalog and Library
//=========================================================================================

/// A search result from the external catalog, normalized and scored.
///
/// Never persisted; built per search request and handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub external_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub average_rating: f64,
    pub published_date: String,
    pub categories: Vec<String>,
    pub page_count: i32,
    pub cover_image: Option<String>,
    pub relevance_score: f64,
}

/// Column width of the title, authors and categories of a stored book.
pub const MAX_BOOK_TEXT_LEN: usize = 255;
/// Column width of a stored publication date.
pub const MAX_PUBLISHED_DATE_LEN: usize = 20;

/// Markup kept when a description is rendered; everything else is stripped.
pub const DESCRIPTION_TAGS: [&str; 10] =
    ["p", "br", "b", "i", "em", "strong", "ul", "ol", "li", "span"];

/// A book in a user's personal library.
///
/// Multi-valued catalog fields (authors, categories) are stored comma-joined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub cover_image: Option<String>,
    pub published_date: Option<String>,
    pub categories: Option<String>,
    pub page_count: Option<i32>,
    pub external_id: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl Book {
    /// Builds a library entry for `user_id` from a normalized catalog entry.
    ///
    /// Text that would overflow its column is cut at a character boundary.
    pub fn from_catalog_entry(user_id: Uuid, entry: CatalogEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: truncate_chars(entry.title, MAX_BOOK_TEXT_LEN),
            authors: truncate_chars(entry.authors.join(", "), MAX_BOOK_TEXT_LEN),
            description: Some(entry.description),
            average_rating: Some(entry.average_rating),
            cover_image: entry.cover_image,
            published_date: Some(truncate_chars(entry.published_date, MAX_PUBLISHED_DATE_LEN)),
            categories: Some(truncate_chars(entry.categories.join(", "), MAX_BOOK_TEXT_LEN)),
            page_count: Some(entry.page_count),
            external_id: Some(entry.external_id),
            date_added: now,
        }
    }

    /// Splits the stored categories back into trimmed, non-empty names.
    pub fn category_list(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The description as safe HTML: only basic formatting tags survive, with no
    /// attributes. Empty when the book has no description.
    pub fn formatted_description(&self) -> String {
        let Some(description) = self.description.as_deref() else {
            return String::new();
        };
        let tags: HashSet<&str> = DESCRIPTION_TAGS.iter().copied().collect();
        ammonia::Builder::default()
            .tags(tags)
            .generic_attributes(HashSet::new())
            .tag_attributes(HashMap::new())
            .clean(description)
            .to_string()
    }
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        text.truncate(cut);
    }
    text
}

/// User-supplied details for a book added without the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub categories: Option<String>,
    pub page_count: Option<i32>,
    pub average_rating: Option<f64>,
    pub cover_image: Option<String>,
}

//=========================================================================================
// Reading Progress
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(ReadingStatus::WantToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "finished" => Ok(ReadingStatus::Finished),
            other => Err(format!("unknown reading status '{}'", other)),
        }
    }
}

/// The unit a progress value is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressType {
    Percentage,
    Page,
}

impl ProgressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressType::Percentage => "percentage",
            ProgressType::Page => "page",
        }
    }
}

impl fmt::Display for ProgressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(ProgressType::Percentage),
            "page" => Ok(ProgressType::Page),
            other => Err(format!("unknown progress type '{}'", other)),
        }
    }
}

/// A user's reading state for one book in their library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub status: ReadingStatus,
    pub progress: i32,
    pub progress_type: ProgressType,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate counts of a user's library by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadingStats {
    pub read: usize,
    pub reading: usize,
    pub to_read: usize,
    pub total: usize,
}

//=========================================================================================
// Reviews
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    /// 1 to 5 stars.
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mean of the given star ratings rounded to one decimal place, or 0 when empty.
pub fn average_user_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = total as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

//=========================================================================================
// Challenges
//=========================================================================================

/// A goal to finish `goal` books between `start_date` and `end_date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Challenge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A book counted towards a challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeBook {
    pub challenge_id: Uuid,
    pub book_id: Uuid,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeProgress {
    pub completed: usize,
    pub total: i32,
    pub percentage: i64,
}

/// Result of linking a book to a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// The book was linked; `completed` is the challenge's flag after the link.
    Linked { completed: bool },
    /// The book was already part of the challenge. Nothing changed.
    AlreadyPresent,
}

/// Result of unlinking a book from a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkOutcome {
    Removed,
    NotLinked,
}
