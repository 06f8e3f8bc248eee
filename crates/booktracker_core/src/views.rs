//! crates/booktracker_core/src/views.rs
//!
//! Inputs accepted by, and aggregates returned from, the `ReadingTracker`.

use crate::domain::{
    Book, Challenge, ChallengeProgress, ProgressType, ReadingProgress, ReadingStats,
    ReadingStatus, Review,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Inputs
//=========================================================================================

/// Narrows a library listing. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryFilter {
    pub status: Option<ReadingStatus>,
    /// Matched as a substring of the book's comma-joined categories.
    pub category: Option<String>,
    pub min_rating: Option<f64>,
}

/// A combined status/progress change, applied status first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingUpdate {
    pub status: Option<ReadingStatus>,
    pub progress: Option<i32>,
    pub progress_type: Option<ProgressType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeInput {
    pub title: String,
    pub description: Option<String>,
    pub goal: i32,
    pub end_date: DateTime<Utc>,
}

//=========================================================================================
// Aggregates
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryItem {
    pub book: Book,
    pub progress: ReadingProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedBook {
    pub book: Book,
    /// True when the book was already in the library and nothing was created.
    pub already_present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub progress: ReadingProgress,
    pub review: Option<Review>,
    pub other_reviews: Vec<Review>,
    pub average_user_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeOverview {
    pub challenge: Challenge,
    pub progress: ChallengeProgress,
    pub days_left: i64,
    pub time_progress: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChallengeList {
    pub active: Vec<ChallengeOverview>,
    pub completed: Vec<ChallengeOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedBook {
    pub book: Book,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeDetail {
    pub overview: ChallengeOverview,
    /// Most recently linked first.
    pub books: Vec<LinkedBook>,
    /// Finished books not yet linked to this challenge.
    pub candidates: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedBook {
    pub book: Book,
    pub date_finished: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub stats: ReadingStats,
    pub recent_books: Vec<FinishedBook>,
    pub monthly: Vec<MonthCount>,
    pub top_rated: Vec<Book>,
    pub active_challenges: Vec<ChallengeOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub current_books: Vec<LibraryItem>,
    pub challenges: Vec<ChallengeOverview>,
    pub stats: ReadingStats,
}
