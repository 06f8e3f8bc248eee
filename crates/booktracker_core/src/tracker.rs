//! crates/booktracker_core/src/tracker.rs
//!
//! The reading tracker: library management, progress updates, reviews, challenges
//! and the aggregated figures shown to the user. All persistence goes through the
//! injected `DatabaseService`; catalog lookups go through `CatalogSearch`.

use crate::domain::{
    average_user_rating, Book, Challenge, LinkOutcome, NewBook, ProgressType, ReadingProgress,
    ReadingStats, ReadingStatus, Review, UnlinkOutcome, MAX_BOOK_TEXT_LEN, MAX_PUBLISHED_DATE_LEN,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::progress::COMPLETE_PERCENTAGE;
use crate::search::CatalogSearch;
use crate::views::{
    AddedBook, BookDetail, ChallengeDetail, ChallengeInput, ChallengeList, ChallengeOverview,
    Dashboard, FinishedBook, LibraryFilter, LibraryItem, LinkedBook, MonthCount, ProfileStats,
    ReadingUpdate,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MAX_CHALLENGE_TITLE_LEN: usize = 100;
const RECENT_BOOKS: usize = 5;
const TOP_RATED_BOOKS: usize = 3;
const DASHBOARD_BOOKS: usize = 3;

#[derive(Clone)]
pub struct ReadingTracker {
    db: Arc<dyn DatabaseService>,
    catalog: CatalogSearch,
    clock: fn() -> DateTime<Utc>,
}

impl ReadingTracker {
    pub fn new(db: Arc<dyn DatabaseService>, catalog: CatalogSearch) -> Self {
        Self {
            db,
            catalog,
            clock: Utc::now,
        }
    }

    /// Replaces the time source used for every timestamp the tracker stamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    //=====================================================================================
    // Library
    //=====================================================================================

    /// Adds a catalog volume to the user's library with a `want_to_read` record.
    pub async fn add_from_catalog(&self, user_id: Uuid, external_id: &str) -> PortResult<AddedBook> {
        if let Some(book) = self.db.find_book_by_external_id(user_id, external_id).await? {
            return Ok(AddedBook {
                book,
                already_present: true,
            });
        }

        let entry = self.catalog.lookup(external_id).await?;
        let now = self.now();
        let book = Book::from_catalog_entry(user_id, entry, now);
        let book = self.store_new_book(book, now).await?;
        info!("User {} added catalog volume {} as book {}", user_id, external_id, book.id);
        Ok(AddedBook {
            book,
            already_present: false,
        })
    }

    /// Adds a book described by the user, with a `want_to_read` record.
    pub async fn add_manual(&self, user_id: Uuid, new_book: NewBook) -> PortResult<Book> {
        validate_new_book(&new_book)?;
        let now = self.now();
        let book = Book {
            id: Uuid::new_v4(),
            user_id,
            title: new_book.title.trim().to_string(),
            authors: new_book.authors.trim().to_string(),
            description: new_book.description,
            average_rating: new_book.average_rating,
            cover_image: new_book.cover_image,
            published_date: new_book.published_date,
            categories: new_book.categories,
            page_count: new_book.page_count,
            external_id: None,
            date_added: now,
        };
        let book = self.store_new_book(book, now).await?;
        info!("User {} added book {} manually", user_id, book.id);
        Ok(book)
    }

    async fn store_new_book(&self, book: Book, now: DateTime<Utc>) -> PortResult<Book> {
        let book = self.db.create_book(book).await?;
        self.db
            .create_progress(ReadingProgress::new(book.user_id, book.id, now))
            .await?;
        Ok(book)
    }

    /// The user's library, paired with progress and narrowed by `filter`.
    pub async fn library(&self, user_id: Uuid, filter: &LibraryFilter) -> PortResult<Vec<LibraryItem>> {
        let entries = self.db.list_progress(user_id, filter.status).await?;
        let mut books = self.books_by_id(user_id).await?;

        let items = entries
            .into_iter()
            .filter_map(|progress| {
                let book = books.remove(&progress.book_id)?;
                Some(LibraryItem { book, progress })
            })
            .filter(|item| matches_filter(&item.book, filter))
            .collect();
        Ok(items)
    }

    /// Distinct categories across the user's library, sorted.
    pub async fn library_categories(&self, user_id: Uuid) -> PortResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .db
            .list_books(user_id)
            .await?
            .iter()
            .flat_map(Book::category_list)
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub async fn book_detail(&self, user_id: Uuid, book_id: Uuid) -> PortResult<BookDetail> {
        let book = self.db.get_book(user_id, book_id).await?;
        let progress = self.db.get_progress(user_id, book_id).await?;
        let reviews = self.db.list_reviews_for_book(book_id).await?;

        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
        let (own, other_reviews): (Vec<Review>, Vec<Review>) =
            reviews.into_iter().partition(|r| r.user_id == user_id);

        Ok(BookDetail {
            book,
            progress,
            review: own.into_iter().next(),
            other_reviews,
            average_user_rating: average_user_rating(&ratings),
        })
    }

    pub async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<()> {
        self.db.get_book(user_id, book_id).await?;
        self.db.delete_book(user_id, book_id).await?;
        info!("User {} deleted book {}", user_id, book_id);
        Ok(())
    }

    //=====================================================================================
    // Progress and Reviews
    //=====================================================================================

    /// Applies a status change and then a progress change, as requested.
    pub async fn update_reading(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        update: ReadingUpdate,
    ) -> PortResult<ReadingProgress> {
        let mut record = self.db.get_progress(user_id, book_id).await?;
        if let Some(progress) = update.progress {
            validate_progress(progress, update.progress_type.unwrap_or(record.progress_type))?;
        }

        let now = self.now();
        if let Some(status) = update.status {
            record.update_status(status, now);
        }
        if let Some(progress) = update.progress {
            record.update_progress(progress, update.progress_type, now);
        }
        if !record.is_consistent() {
            return Err(PortError::Invalid(format!(
                "a finished book tracked in percent must be at {}",
                COMPLETE_PERCENTAGE
            )));
        }
        self.db.save_progress(&record).await?;
        Ok(record)
    }

    /// Creates or replaces the user's review of a book in their library.
    pub async fn submit_review(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        rating: i32,
        review_text: Option<String>,
    ) -> PortResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(PortError::Invalid("rating must be between 1 and 5".to_string()));
        }
        self.db.get_book(user_id, book_id).await?;

        let now = self.now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            rating,
            review_text,
            created_at: now,
            updated_at: now,
        };
        self.db.upsert_review(review).await
    }

    //=====================================================================================
    // Challenges
    //=====================================================================================

    pub async fn create_challenge(&self, user_id: Uuid, input: ChallengeInput) -> PortResult<Challenge> {
        let now = self.now();
        validate_challenge(&input)?;
        if input.end_date.date_naive() <= now.date_naive() {
            return Err(PortError::Invalid("end date must be in the future".to_string()));
        }

        let challenge = Challenge::new(
            user_id,
            Some(input.title.trim().to_string()),
            input.description,
            input.goal,
            input.end_date,
            now,
        );
        let challenge = self.db.create_challenge(challenge).await?;
        info!("User {} created challenge {} (goal {})", user_id, challenge.id, challenge.goal);
        Ok(challenge)
    }

    /// Edits an active challenge. Completed challenges are frozen.
    pub async fn update_challenge(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        input: ChallengeInput,
    ) -> PortResult<Challenge> {
        validate_challenge(&input)?;
        let mut challenge = self.db.get_challenge(user_id, challenge_id).await?;
        if challenge.completed {
            return Err(PortError::Conflict(
                "completed challenges cannot be edited".to_string(),
            ));
        }

        challenge.title = Some(input.title.trim().to_string());
        challenge.description = input.description;
        challenge.goal = input.goal;
        challenge.end_date = input.end_date;
        self.db.update_challenge(&challenge).await?;
        Ok(challenge)
    }

    pub async fn delete_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<()> {
        self.db.get_challenge(user_id, challenge_id).await?;
        self.db.delete_challenge(user_id, challenge_id).await?;
        info!("User {} deleted challenge {}", user_id, challenge_id);
        Ok(())
    }

    pub async fn list_challenges(&self, user_id: Uuid) -> PortResult<ChallengeList> {
        let active = self.overviews(self.db.list_challenges(user_id, false).await?).await?;
        let completed = self.overviews(self.db.list_challenges(user_id, true).await?).await?;
        Ok(ChallengeList { active, completed })
    }

    pub async fn challenge_detail(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<ChallengeDetail> {
        let challenge = self.db.get_challenge(user_id, challenge_id).await?;
        let links = self.db.list_challenge_books(challenge.id).await?;
        let overview = self.overview(challenge, links.len());

        let mut books = self.books_by_id(user_id).await?;
        let linked_ids: HashSet<Uuid> = links.iter().map(|l| l.book_id).collect();
        let linked = links
            .iter()
            .filter_map(|link| {
                let book = books.get(&link.book_id)?.clone();
                Some(LinkedBook {
                    book,
                    date_added: link.date_added,
                })
            })
            .collect();

        let candidates = self
            .db
            .list_progress(user_id, Some(ReadingStatus::Finished))
            .await?
            .into_iter()
            .filter(|p| !linked_ids.contains(&p.book_id))
            .filter_map(|p| books.remove(&p.book_id))
            .collect();

        Ok(ChallengeDetail {
            overview,
            books: linked,
            candidates,
        })
    }

    /// Counts a finished book towards a challenge.
    pub async fn add_book_to_challenge(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<LinkOutcome> {
        let challenge = self.db.get_challenge(user_id, challenge_id).await?;
        let book = self.db.get_book(user_id, book_id).await?;
        let finished = match self.db.get_progress(user_id, book.id).await {
            Ok(progress) => progress.status == ReadingStatus::Finished,
            Err(PortError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };
        if !finished {
            return Err(PortError::Invalid(
                "only finished books can be added to a challenge".to_string(),
            ));
        }

        let outcome = self
            .db
            .link_challenge_book(challenge.id, book.id, self.now())
            .await?;
        info!("Linking book {} to challenge {}: {:?}", book.id, challenge.id, outcome);
        Ok(outcome)
    }

    pub async fn remove_book_from_challenge(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<UnlinkOutcome> {
        let challenge = self.db.get_challenge(user_id, challenge_id).await?;
        let book = self.db.get_book(user_id, book_id).await?;
        self.db.unlink_challenge_book(challenge.id, book.id).await
    }

    async fn overviews(&self, challenges: Vec<Challenge>) -> PortResult<Vec<ChallengeOverview>> {
        let mut overviews = Vec::with_capacity(challenges.len());
        for challenge in challenges {
            let linked = self.db.list_challenge_books(challenge.id).await?.len();
            overviews.push(self.overview(challenge, linked));
        }
        Ok(overviews)
    }

    fn overview(&self, challenge: Challenge, linked_books: usize) -> ChallengeOverview {
        let now = self.now();
        ChallengeOverview {
            progress: challenge.progress(linked_books),
            days_left: challenge.days_left(now),
            time_progress: challenge.time_progress(now),
            challenge,
        }
    }

    //=====================================================================================
    // Statistics
    //=====================================================================================

    pub async fn reading_stats(&self, user_id: Uuid) -> PortResult<ReadingStats> {
        let entries = self.db.list_progress(user_id, None).await?;
        Ok(count_by_status(&entries))
    }

    /// Reading statistics page: counts, recent finishes, monthly activity for `year`,
    /// top rated books and active challenges.
    pub async fn profile_stats(&self, user_id: Uuid, year: i32) -> PortResult<ProfileStats> {
        let entries = self.db.list_progress(user_id, None).await?;
        let stats = count_by_status(&entries);
        let books = self.books_by_id(user_id).await?;

        let mut finished: Vec<(&ReadingProgress, DateTime<Utc>)> = entries
            .iter()
            .filter(|p| p.status == ReadingStatus::Finished)
            .filter_map(|p| p.end_date.map(|end| (p, end)))
            .collect();
        finished.sort_by(|a, b| b.1.cmp(&a.1));

        let recent_books = finished
            .iter()
            .filter_map(|(p, end)| {
                let book = books.get(&p.book_id)?.clone();
                Some(FinishedBook {
                    book,
                    date_finished: *end,
                })
            })
            .take(RECENT_BOOKS)
            .collect();

        let finish_dates: Vec<DateTime<Utc>> = finished.iter().map(|(_, end)| *end).collect();
        let monthly = monthly_counts(year, &finish_dates);

        let top_rated = self
            .db
            .list_reviews_by_user(user_id)
            .await?
            .iter()
            .filter_map(|r| books.get(&r.book_id).cloned())
            .take(TOP_RATED_BOOKS)
            .collect();

        let active_challenges = self.overviews(self.db.list_challenges(user_id, false).await?).await?;

        Ok(ProfileStats {
            stats,
            recent_books,
            monthly,
            top_rated,
            active_challenges,
        })
    }

    /// Home page: books in progress, the soonest-ending active challenge and counts.
    pub async fn dashboard(&self, user_id: Uuid) -> PortResult<Dashboard> {
        let entries = self.db.list_progress(user_id, None).await?;
        let stats = count_by_status(&entries);
        let mut books = self.books_by_id(user_id).await?;

        let current_books = entries
            .into_iter()
            .filter(|p| p.status == ReadingStatus::Reading)
            .filter_map(|progress| {
                let book = books.remove(&progress.book_id)?;
                Some(LibraryItem { book, progress })
            })
            .take(DASHBOARD_BOOKS)
            .collect();

        let soonest = self
            .db
            .list_challenges(user_id, false)
            .await?
            .into_iter()
            .take(1)
            .collect();
        let challenges = self.overviews(soonest).await?;

        Ok(Dashboard {
            current_books,
            challenges,
            stats,
        })
    }

    async fn books_by_id(&self, user_id: Uuid) -> PortResult<HashMap<Uuid, Book>> {
        Ok(self
            .db
            .list_books(user_id)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect())
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn matches_filter(book: &Book, filter: &LibraryFilter) -> bool {
    if let Some(category) = filter.category.as_deref() {
        match book.categories.as_deref() {
            Some(categories) if categories.contains(category) => {}
            _ => return false,
        }
    }
    if let Some(min_rating) = filter.min_rating {
        if book.average_rating.unwrap_or_default() < min_rating {
            return false;
        }
    }
    true
}

fn count_by_status(entries: &[ReadingProgress]) -> ReadingStats {
    let count = |status: ReadingStatus| entries.iter().filter(|p| p.status == status).count();
    let read = count(ReadingStatus::Finished);
    let reading = count(ReadingStatus::Reading);
    let to_read = count(ReadingStatus::WantToRead);
    ReadingStats {
        read,
        reading,
        to_read,
        total: read + reading + to_read,
    }
}

/// Number of finish dates falling in each month of `year`, January first.
fn monthly_counts(year: i32, finish_dates: &[DateTime<Utc>]) -> Vec<MonthCount> {
    (1..=12u32)
        .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .map(|first| MonthCount {
            month: first.format("%b").to_string(),
            count: finish_dates
                .iter()
                .filter(|d| d.year() == year && d.month() == first.month())
                .count(),
        })
        .collect()
}

fn validate_new_book(book: &NewBook) -> PortResult<()> {
    let required = [("title", &book.title), ("authors", &book.authors)];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(PortError::Invalid(format!("{} is required", field)));
        }
        if value.chars().count() > MAX_BOOK_TEXT_LEN {
            return Err(PortError::Invalid(format!(
                "{} must be at most {} characters",
                field, MAX_BOOK_TEXT_LEN
            )));
        }
    }

    let optional = [
        ("published_date", &book.published_date, MAX_PUBLISHED_DATE_LEN),
        ("categories", &book.categories, MAX_BOOK_TEXT_LEN),
        ("cover_image", &book.cover_image, MAX_BOOK_TEXT_LEN),
    ];
    for (field, value, max) in optional {
        if value.as_ref().is_some_and(|v| v.chars().count() > max) {
            return Err(PortError::Invalid(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }

    if book.page_count.is_some_and(|p| p < 1) {
        return Err(PortError::Invalid("page_count must be at least 1".to_string()));
    }
    if book.average_rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        return Err(PortError::Invalid("average_rating must be between 0 and 5".to_string()));
    }
    Ok(())
}

fn validate_progress(progress: i32, progress_type: ProgressType) -> PortResult<()> {
    if progress < 0 {
        return Err(PortError::Invalid("progress cannot be negative".to_string()));
    }
    if progress_type == ProgressType::Percentage && progress > COMPLETE_PERCENTAGE {
        return Err(PortError::Invalid(
            "percentage progress must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

fn validate_challenge(input: &ChallengeInput) -> PortResult<()> {
    if input.title.trim().is_empty() {
        return Err(PortError::Invalid("title is required".to_string()));
    }
    if input.title.chars().count() > MAX_CHALLENGE_TITLE_LEN {
        return Err(PortError::Invalid(format!(
            "title must be at most {} characters",
            MAX_CHALLENGE_TITLE_LEN
        )));
    }
    if input.goal < 1 {
        return Err(PortError::Invalid("goal must be at least 1".to_string()));
    }
    Ok(())
}
