//! crates/booktracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::catalog::Volume;
use crate::domain::{
    Book, Challenge, ChallengeBook, LinkOutcome, ReadingProgress, ReadingStatus, Review,
    UnlinkOutcome, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The external book-metadata search service.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Runs a free-text volume search, returning at most `max_results` raw volumes.
    async fn search_volumes(&self, query: &str, max_results: u32) -> PortResult<Vec<Volume>>;

    /// Fetches a single volume by its provider identifier.
    async fn get_volume(&self, external_id: &str) -> PortResult<Volume>;
}

/// Resolves an account from its identifier.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns the matching account, or `PortError::NotFound`.
    async fn find_account(&self, user_id: Uuid) -> PortResult<User>;
}

/// The relational store. Every query is scoped to the owning user where the entity
/// has one; a row owned by someone else is reported as `NotFound`.
#[async_trait]
pub trait DatabaseService: AccountDirectory {
    // --- Accounts ---
    /// Fails with `PortError::Conflict` when the username or email is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the session's user, or `PortError::Unauthorized` if missing or expired.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Books ---
    async fn create_book(&self, book: Book) -> PortResult<Book>;

    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Book>;

    async fn find_book_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> PortResult<Option<Book>>;

    /// All of the user's books, newest first.
    async fn list_books(&self, user_id: Uuid) -> PortResult<Vec<Book>>;

    /// Deletes the book together with its progress record, reviews and challenge links.
    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<()>;

    // --- Reading Progress ---
    async fn create_progress(&self, progress: ReadingProgress) -> PortResult<ReadingProgress>;

    async fn get_progress(&self, user_id: Uuid, book_id: Uuid) -> PortResult<ReadingProgress>;

    async fn save_progress(&self, progress: &ReadingProgress) -> PortResult<()>;

    /// The user's progress records, optionally limited to one status, most recently
    /// updated first.
    async fn list_progress(
        &self,
        user_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<Vec<ReadingProgress>>;

    // --- Reviews ---
    /// Inserts the review, or replaces rating and text of the user's existing one.
    async fn upsert_review(&self, review: Review) -> PortResult<Review>;

    /// Every review of the book, oldest first.
    async fn list_reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<Review>>;

    /// The user's own reviews, highest rating first.
    async fn list_reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>>;

    // --- Challenges ---
    async fn create_challenge(&self, challenge: Challenge) -> PortResult<Challenge>;

    async fn get_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<Challenge>;

    async fn update_challenge(&self, challenge: &Challenge) -> PortResult<()>;

    /// Deletes the challenge together with its book links.
    async fn delete_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<()>;

    /// Challenges with the given completion flag. Active ones are ordered by end date
    /// ascending, completed ones by end date descending.
    async fn list_challenges(&self, user_id: Uuid, completed: bool)
        -> PortResult<Vec<Challenge>>;

    /// The challenge's book links, most recently added first.
    async fn list_challenge_books(&self, challenge_id: Uuid) -> PortResult<Vec<ChallengeBook>>;

    /// Links a book and updates the completion flag in one transaction.
    async fn link_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<LinkOutcome>;

    /// Unlinks a book and clears the completion flag in one transaction.
    async fn unlink_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<UnlinkOutcome>;
}
