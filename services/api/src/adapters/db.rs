//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use booktracker_core::domain::{
    Book, Challenge, ChallengeBook, LinkOutcome, ProgressType, ReadingProgress, ReadingStatus,
    Review, UnlinkOutcome, User, UserCredentials,
};
use booktracker_core::ports::{AccountDirectory, DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const BOOK_COLUMNS: &str = "id, user_id, title, authors, description, average_rating, \
     cover_image, published_date, categories, page_count, external_id, date_added";
const PROGRESS_COLUMNS: &str = "id, user_id, book_id, status, progress, progress_type, \
     start_date, end_date, last_updated";
const REVIEW_COLUMNS: &str =
    "id, user_id, book_id, rating, review_text, created_at, updated_at";
const CHALLENGE_COLUMNS: &str = "id, user_id, title, description, goal, start_date, end_date, \
     completed, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => unexpected(e),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                user_id: self.user_id,
                username: self.username,
                email: self.email,
            },
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    authors: String,
    description: Option<String>,
    average_rating: Option<f64>,
    cover_image: Option<String>,
    published_date: Option<String>,
    categories: Option<String>,
    page_count: Option<i32>,
    external_id: Option<String>,
    date_added: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            authors: self.authors,
            description: self.description,
            average_rating: self.average_rating,
            cover_image: self.cover_image,
            published_date: self.published_date,
            categories: self.categories,
            page_count: self.page_count,
            external_id: self.external_id,
            date_added: self.date_added,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    status: String,
    progress: i32,
    progress_type: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    last_updated: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> PortResult<ReadingProgress> {
        Ok(ReadingProgress {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            status: self.status.parse::<ReadingStatus>().map_err(PortError::Unexpected)?,
            progress: self.progress,
            progress_type: self
                .progress_type
                .parse::<ProgressType>()
                .map_err(PortError::Unexpected)?,
            start_date: self.start_date,
            end_date: self.end_date,
            last_updated: self.last_updated,
        })
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    rating: i32,
    review_text: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            rating: self.rating,
            review_text: self.review_text,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ChallengeRecord {
    id: Uuid,
    user_id: Uuid,
    title: Option<String>,
    description: Option<String>,
    goal: i32,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    completed: bool,
    created_at: DateTime<Utc>,
}
impl ChallengeRecord {
    fn to_domain(self) -> Challenge {
        Challenge {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            goal: self.goal,
            start_date: self.start_date,
            end_date: self.end_date,
            completed: self.completed,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChallengeBookRecord {
    challenge_id: Uuid,
    book_id: Uuid,
    date_added: DateTime<Utc>,
}
impl ChallengeBookRecord {
    fn to_domain(self) -> ChallengeBook {
        ChallengeBook {
            challenge_id: self.challenge_id,
            book_id: self.book_id,
            date_added: self.date_added,
        }
    }
}

//=========================================================================================
// `AccountDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountDirectory for DbAdapter {
    async fn find_account(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, email, hashed_password FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain().user)
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Accounts ---

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, username, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING user_id, username, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("Username or email is already registered".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain().user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User with email {} not found", email)))?;
        Ok(record.to_domain())
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Books ---

    async fn create_book(&self, book: Book) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "INSERT INTO books ({BOOK_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(book.id)
        .bind(book.user_id)
        .bind(book.title)
        .bind(book.authors)
        .bind(book.description)
        .bind(book.average_rating)
        .bind(book.cover_image)
        .bind(book.published_date)
        .bind(book.categories)
        .bind(book.page_count)
        .bind(book.external_id)
        .bind(book.date_added)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 AND user_id = $2"
        ))
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Book {} not found", book_id)))?;
        Ok(record.to_domain())
    }

    async fn find_book_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> PortResult<Option<Book>> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = $1 AND external_id = $2 LIMIT 1"
        ))
        .bind(user_id)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(BookRecord::to_domain))
    }

    async fn list_books(&self, user_id: Uuid) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = $1 ORDER BY date_added DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(BookRecord::to_domain).collect())
    }

    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for statement in [
            "DELETE FROM challenge_books WHERE book_id = $1",
            "DELETE FROM reading_progress WHERE book_id = $1",
            "DELETE FROM reviews WHERE book_id = $1",
        ] {
            sqlx::query(statement)
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        let deleted = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if deleted == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    // --- Reading Progress ---

    async fn create_progress(&self, progress: ReadingProgress) -> PortResult<ReadingProgress> {
        let record = sqlx::query_as::<_, ProgressRecord>(&format!(
            "INSERT INTO reading_progress ({PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(progress.id)
        .bind(progress.user_id)
        .bind(progress.book_id)
        .bind(progress.status.as_str())
        .bind(progress.progress)
        .bind(progress.progress_type.as_str())
        .bind(progress.start_date)
        .bind(progress.end_date)
        .bind(progress.last_updated)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_progress(&self, user_id: Uuid, book_id: Uuid) -> PortResult<ReadingProgress> {
        let record = sqlx::query_as::<_, ProgressRecord>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM reading_progress WHERE book_id = $1 AND user_id = $2"
        ))
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Progress for book {} not found", book_id))
        })?;
        record.to_domain()
    }

    async fn save_progress(&self, progress: &ReadingProgress) -> PortResult<()> {
        let updated = sqlx::query(
            "UPDATE reading_progress SET status = $1, progress = $2, progress_type = $3, \
             start_date = $4, end_date = $5, last_updated = $6 WHERE id = $7",
        )
        .bind(progress.status.as_str())
        .bind(progress.progress)
        .bind(progress.progress_type.as_str())
        .bind(progress.start_date)
        .bind(progress.end_date)
        .bind(progress.last_updated)
        .bind(progress.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?
        .rows_affected();
        if updated == 0 {
            return Err(PortError::NotFound(format!("Progress {} not found", progress.id)));
        }
        Ok(())
    }

    async fn list_progress(
        &self,
        user_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<Vec<ReadingProgress>> {
        let records = sqlx::query_as::<_, ProgressRecord>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM reading_progress \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY last_updated DESC"
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(ProgressRecord::to_domain).collect()
    }

    // --- Reviews ---

    async fn upsert_review(&self, review: Review) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET rating = EXCLUDED.rating, \
             review_text = EXCLUDED.review_text, updated_at = EXCLUDED.updated_at \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.book_id)
        .bind(review.rating)
        .bind(review.review_text)
        .bind(review.created_at)
        .bind(review.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = $1 ORDER BY created_at ASC"
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ReviewRecord::to_domain).collect())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 \
             ORDER BY rating DESC, updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ReviewRecord::to_domain).collect())
    }

    // --- Challenges ---

    async fn create_challenge(&self, challenge: Challenge) -> PortResult<Challenge> {
        let record = sqlx::query_as::<_, ChallengeRecord>(&format!(
            "INSERT INTO challenges ({CHALLENGE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {CHALLENGE_COLUMNS}"
        ))
        .bind(challenge.id)
        .bind(challenge.user_id)
        .bind(challenge.title)
        .bind(challenge.description)
        .bind(challenge.goal)
        .bind(challenge.start_date)
        .bind(challenge.end_date)
        .bind(challenge.completed)
        .bind(challenge.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<Challenge> {
        let record = sqlx::query_as::<_, ChallengeRecord>(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = $1 AND user_id = $2"
        ))
        .bind(challenge_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Challenge {} not found", challenge_id))
        })?;
        Ok(record.to_domain())
    }

    async fn update_challenge(&self, challenge: &Challenge) -> PortResult<()> {
        sqlx::query(
            "UPDATE challenges SET title = $1, description = $2, goal = $3, end_date = $4, \
             completed = $5 WHERE id = $6 AND user_id = $7",
        )
        .bind(&challenge.title)
        .bind(&challenge.description)
        .bind(challenge.goal)
        .bind(challenge.end_date)
        .bind(challenge.completed)
        .bind(challenge.id)
        .bind(challenge.user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM challenge_books WHERE challenge_id = $1")
            .bind(challenge_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        sqlx::query("DELETE FROM challenges WHERE id = $1 AND user_id = $2")
            .bind(challenge_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn list_challenges(&self, user_id: Uuid, completed: bool) -> PortResult<Vec<Challenge>> {
        let order = if completed { "DESC" } else { "ASC" };
        let records = sqlx::query_as::<_, ChallengeRecord>(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE user_id = $1 AND completed = $2 \
             ORDER BY end_date {order}"
        ))
        .bind(user_id)
        .bind(completed)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ChallengeRecord::to_domain).collect())
    }

    async fn list_challenge_books(&self, challenge_id: Uuid) -> PortResult<Vec<ChallengeBook>> {
        let records = sqlx::query_as::<_, ChallengeBookRecord>(
            "SELECT challenge_id, book_id, date_added FROM challenge_books \
             WHERE challenge_id = $1 ORDER BY date_added DESC",
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ChallengeBookRecord::to_domain).collect())
    }

    async fn link_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<LinkOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Lock the challenge row so concurrent links see each other's counts.
        let mut challenge = sqlx::query_as::<_, ChallengeRecord>(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = $1 FOR UPDATE"
        ))
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Challenge {} not found", challenge_id))
        })?
        .to_domain();

        let inserted = sqlx::query(
            "INSERT INTO challenge_books (challenge_id, book_id, date_added) VALUES ($1, $2, $3) \
             ON CONFLICT (challenge_id, book_id) DO NOTHING",
        )
        .bind(challenge_id)
        .bind(book_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();
        if inserted == 0 {
            tx.rollback().await.map_err(unexpected)?;
            return Ok(LinkOutcome::AlreadyPresent);
        }

        let (linked,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM challenge_books WHERE challenge_id = $1")
                .bind(challenge_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
        challenge.record_link(linked.max(0) as usize);

        sqlx::query("UPDATE challenges SET completed = $1 WHERE id = $2")
            .bind(challenge.completed)
            .bind(challenge_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(LinkOutcome::Linked {
            completed: challenge.completed,
        })
    }

    async fn unlink_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<UnlinkOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let mut challenge = sqlx::query_as::<_, ChallengeRecord>(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = $1 FOR UPDATE"
        ))
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Challenge {} not found", challenge_id))
        })?
        .to_domain();

        let removed =
            sqlx::query("DELETE FROM challenge_books WHERE challenge_id = $1 AND book_id = $2")
                .bind(challenge_id)
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?
                .rows_affected();
        if removed == 0 {
            tx.rollback().await.map_err(unexpected)?;
            return Ok(UnlinkOutcome::NotLinked);
        }

        challenge.record_unlink();
        sqlx::query("UPDATE challenges SET completed = $1 WHERE id = $2")
            .bind(challenge.completed)
            .bind(challenge_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(UnlinkOutcome::Removed)
    }
}
