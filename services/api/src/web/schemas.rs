//! services/api/src/web/schemas.rs
//!
//! Request and response payloads for the REST API. Each response type mirrors a
//! core type and is built from it with `From`; enums travel as their snake_case names.

use booktracker_core::domain::{
    Book, CatalogEntry, Challenge, LinkOutcome, NewBook, ProgressType, ReadingProgress,
    ReadingStats, ReadingStatus, Review, UnlinkOutcome,
};
use booktracker_core::views::{
    AddedBook, BookDetail, ChallengeDetail, ChallengeInput, ChallengeList, ChallengeOverview,
    Dashboard, FinishedBook, LibraryFilter, LibraryItem, LinkedBook, MonthCount, ProfileStats,
    ReadingUpdate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Query Parameters
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text catalog query.
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LibraryQuery {
    /// One of `want_to_read`, `reading`, `finished`.
    pub status: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
}

impl LibraryQuery {
    pub fn into_filter(self) -> Result<LibraryFilter, String> {
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<ReadingStatus>())
            .transpose()?;
        Ok(LibraryFilter {
            status,
            category: self.category.filter(|c| !c.trim().is_empty()),
            min_rating: self.min_rating,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Calendar year for the monthly breakdown; defaults to the current year.
    pub year: Option<i32>,
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewBookRequest {
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub categories: Option<String>,
    pub page_count: Option<i32>,
    pub average_rating: Option<f64>,
    pub cover_image: Option<String>,
}

impl From<NewBookRequest> for NewBook {
    fn from(req: NewBookRequest) -> Self {
        NewBook {
            title: req.title,
            authors: req.authors,
            description: req.description,
            published_date: req.published_date,
            categories: req.categories,
            page_count: req.page_count,
            average_rating: req.average_rating,
            cover_image: req.cover_image,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressUpdateRequest {
    pub status: Option<String>,
    pub progress: Option<i32>,
    pub progress_type: Option<String>,
}

impl ProgressUpdateRequest {
    pub fn into_update(self) -> Result<ReadingUpdate, String> {
        Ok(ReadingUpdate {
            status: self.status.map(|s| s.parse::<ReadingStatus>()).transpose()?,
            progress: self.progress,
            progress_type: self
                .progress_type
                .map(|t| t.parse::<ProgressType>())
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub rating: i32,
    pub review_text: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChallengeRequest {
    pub title: String,
    pub description: Option<String>,
    pub goal: i32,
    pub end_date: DateTime<Utc>,
}

impl From<ChallengeRequest> for ChallengeInput {
    fn from(req: ChallengeRequest) -> Self {
        ChallengeInput {
            title: req.title,
            description: req.description,
            goal: req.goal,
            end_date: req.end_date,
        }
    }
}

//=========================================================================================
// Library Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogEntryResponse {
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

impl From<CatalogEntry> for CatalogEntryResponse {
    fn from(e: CatalogEntry) -> Self {
        Self {
            external_id: e.external_id,
            title: e.title,
            authors: e.authors,
            description: e.description,
            average_rating: e.average_rating,
            published_date: e.published_date,
            categories: e.categories,
            page_count: e.page_count,
            cover_image: e.cover_image,
            relevance_score: e.relevance_score,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    /// The description reduced to basic formatting markup, safe to render as HTML.
    pub formatted_description: String,
    pub average_rating: Option<f64>,
    pub cover_image: Option<String>,
    pub published_date: Option<String>,
    pub categories: Option<String>,
    pub page_count: Option<i32>,
    pub external_id: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(b: Book) -> Self {
        Self {
            formatted_description: b.formatted_description(),
            id: b.id,
            title: b.title,
            authors: b.authors,
            description: b.description,
            average_rating: b.average_rating,
            cover_image: b.cover_image,
            published_date: b.published_date,
            categories: b.categories,
            page_count: b.page_count,
            external_id: b.external_id,
            date_added: b.date_added,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub book_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub progress_type: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl From<ReadingProgress> for ProgressResponse {
    fn from(p: ReadingProgress) -> Self {
        Self {
            book_id: p.book_id,
            status: p.status.to_string(),
            progress: p.progress,
            progress_type: p.progress_type.to_string(),
            start_date: p.start_date,
            end_date: p.end_date,
            last_updated: p.last_updated,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryItemResponse {
    pub book: BookResponse,
    pub progress: ProgressResponse,
}

impl From<LibraryItem> for LibraryItemResponse {
    fn from(item: LibraryItem) -> Self {
        Self {
            book: item.book.into(),
            progress: item.progress.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddedBookResponse {
    pub book: BookResponse,
    pub already_present: bool,
}

impl From<AddedBook> for AddedBookResponse {
    fn from(added: AddedBook) -> Self {
        Self {
            book: added.book.into(),
            already_present: added.already_present,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            book_id: r.book_id,
            rating: r.rating,
            review_text: r.review_text,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookDetailResponse {
    pub book: BookResponse,
    pub progress: ProgressResponse,
    pub review: Option<ReviewResponse>,
    pub other_reviews: Vec<ReviewResponse>,
    pub average_user_rating: f64,
}

impl From<BookDetail> for BookDetailResponse {
    fn from(d: BookDetail) -> Self {
        Self {
            book: d.book.into(),
            progress: d.progress.into(),
            review: d.review.map(Into::into),
            other_reviews: d.other_reviews.into_iter().map(Into::into).collect(),
            average_user_rating: d.average_user_rating,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub read: usize,
    pub reading: usize,
    pub to_read: usize,
    pub total: usize,
}

impl From<ReadingStats> for StatsResponse {
    fn from(s: ReadingStats) -> Self {
        Self {
            read: s.read,
            reading: s.reading,
            to_read: s.to_read,
            total: s.total,
        }
    }
}

//=========================================================================================
// Challenge Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeResponse {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Challenge> for ChallengeResponse {
    fn from(c: Challenge) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            goal: c.goal,
            start_date: c.start_date,
            end_date: c.end_date,
            completed: c.completed,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeOverviewResponse {
    pub challenge: ChallengeResponse,
    /// Books linked so far.
    pub books_completed: usize,
    pub percentage: i64,
    pub days_left: i64,
    pub time_progress: i64,
}

impl From<ChallengeOverview> for ChallengeOverviewResponse {
    fn from(o: ChallengeOverview) -> Self {
        Self {
            challenge: o.challenge.into(),
            books_completed: o.progress.completed,
            percentage: o.progress.percentage,
            days_left: o.days_left,
            time_progress: o.time_progress,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeListResponse {
    pub active: Vec<ChallengeOverviewResponse>,
    pub completed: Vec<ChallengeOverviewResponse>,
}

impl From<ChallengeList> for ChallengeListResponse {
    fn from(list: ChallengeList) -> Self {
        Self {
            active: list.active.into_iter().map(Into::into).collect(),
            completed: list.completed.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkedBookResponse {
    pub book: BookResponse,
    pub date_added: DateTime<Utc>,
}

impl From<LinkedBook> for LinkedBookResponse {
    fn from(l: LinkedBook) -> Self {
        Self {
            book: l.book.into(),
            date_added: l.date_added,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeDetailResponse {
    pub overview: ChallengeOverviewResponse,
    pub books: Vec<LinkedBookResponse>,
    pub candidates: Vec<BookResponse>,
}

impl From<ChallengeDetail> for ChallengeDetailResponse {
    fn from(d: ChallengeDetail) -> Self {
        Self {
            overview: d.overview.into(),
            books: d.books.into_iter().map(Into::into).collect(),
            candidates: d.candidates.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of adding or removing a challenge book.
#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    /// `linked`, `already_present`, `removed` or `not_linked`.
    pub outcome: String,
    /// The challenge's completion flag after a successful link.
    pub completed: Option<bool>,
}

impl From<LinkOutcome> for MembershipResponse {
    fn from(outcome: LinkOutcome) -> Self {
        match outcome {
            LinkOutcome::Linked { completed } => Self {
                outcome: "linked".to_string(),
                completed: Some(completed),
            },
            LinkOutcome::AlreadyPresent => Self {
                outcome: "already_present".to_string(),
                completed: None,
            },
        }
    }
}

impl From<UnlinkOutcome> for MembershipResponse {
    fn from(outcome: UnlinkOutcome) -> Self {
        let outcome = match outcome {
            UnlinkOutcome::Removed => "removed",
            UnlinkOutcome::NotLinked => "not_linked",
        };
        Self {
            outcome: outcome.to_string(),
            completed: None,
        }
    }
}

//=========================================================================================
// Profile Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct FinishedBookResponse {
    pub book: BookResponse,
    pub date_finished: DateTime<Utc>,
}

impl From<FinishedBook> for FinishedBookResponse {
    fn from(f: FinishedBook) -> Self {
        Self {
            book: f.book.into(),
            date_finished: f.date_finished,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthCountResponse {
    pub month: String,
    pub count: usize,
}

impl From<MonthCount> for MonthCountResponse {
    fn from(m: MonthCount) -> Self {
        Self {
            month: m.month,
            count: m.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileStatsResponse {
    pub stats: StatsResponse,
    pub recent_books: Vec<FinishedBookResponse>,
    pub monthly: Vec<MonthCountResponse>,
    pub top_rated: Vec<BookResponse>,
    pub active_challenges: Vec<ChallengeOverviewResponse>,
}

impl From<ProfileStats> for ProfileStatsResponse {
    fn from(p: ProfileStats) -> Self {
        Self {
            stats: p.stats.into(),
            recent_books: p.recent_books.into_iter().map(Into::into).collect(),
            monthly: p.monthly.into_iter().map(Into::into).collect(),
            top_rated: p.top_rated.into_iter().map(Into::into).collect(),
            active_challenges: p.active_challenges.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub current_books: Vec<LibraryItemResponse>,
    pub challenges: Vec<ChallengeOverviewResponse>,
    pub stats: StatsResponse,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            current_books: d.current_books.into_iter().map(Into::into).collect(),
            challenges: d.challenges.into_iter().map(Into::into).collect(),
            stats: d.stats.into(),
        }
    }
}
