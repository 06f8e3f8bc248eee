//! In-memory implementations of the core ports for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use booktracker_core::catalog::{Volume, VolumeInfo};
use booktracker_core::{
    AccountDirectory, Book, CatalogProvider, Challenge, ChallengeBook, DatabaseService,
    LinkOutcome, PortError, PortResult, ReadingProgress, ReadingStatus, Review, UnlinkOutcome,
    User, UserCredentials,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

//=========================================================================================
// Catalog provider
//=========================================================================================

/// Serves a fixed list of volumes, or fails every call when `fail` is set.
#[derive(Default)]
pub struct ScriptedCatalog {
    pub volumes: Vec<Volume>,
    pub fail: bool,
    pub searches: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn with(volumes: Vec<Volume>) -> Self {
        Self {
            volumes,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for ScriptedCatalog {
    async fn search_volumes(&self, _query: &str, max_results: u32) -> PortResult<Vec<Volume>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PortError::Unavailable("catalog returned 503".to_string()));
        }
        Ok(self.volumes.iter().take(max_results as usize).cloned().collect())
    }

    async fn get_volume(&self, external_id: &str) -> PortResult<Volume> {
        if self.fail {
            return Err(PortError::Unavailable("catalog returned 503".to_string()));
        }
        self.volumes
            .iter()
            .find(|v| v.id == external_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("volume {}", external_id)))
    }
}

pub fn volume(id: &str, title: &str, authors: &[&str], description: Option<&str>) -> Volume {
    Volume {
        id: id.to_string(),
        volume_info: VolumeInfo {
            title: Some(title.to_string()),
            authors: Some(authors.iter().map(|a| a.to_string()).collect()),
            description: description.map(str::to_string),
            categories: Some(vec!["Fiction".to_string()]),
            page_count: Some(320),
            ..Default::default()
        },
    }
}

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    books: Vec<Book>,
    progress: Vec<ReadingProgress>,
    reviews: Vec<Review>,
    challenges: Vec<Challenge>,
    links: Vec<ChallengeBook>,
}

/// A `DatabaseService` backed by vectors behind one mutex; each call is atomic.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    progress_unavailable: AtomicBool,
}

impl MemoryDb {
    /// Makes every later `get_progress` call fail as if the store were down.
    pub fn make_progress_unavailable(&self) {
        self.progress_unavailable.store(true, Ordering::SeqCst);
    }

    pub fn challenge(&self, challenge_id: Uuid) -> Challenge {
        let tables = self.tables.lock().unwrap();
        tables
            .challenges
            .iter()
            .find(|c| c.id == challenge_id)
            .cloned()
            .expect("challenge exists")
    }

    pub fn link_count(&self, challenge_id: Uuid) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.links.iter().filter(|l| l.challenge_id == challenge_id).count()
    }
}

fn not_found(what: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl AccountDirectory for MemoryDb {
    async fn find_account(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|c| c.user.user_id == user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| not_found("User", user_id))
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|c| c.user.username == username || c.user.email == email)
        {
            return Err(PortError::Conflict("username or email taken".to_string()));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned()
            .ok_or_else(|| not_found("User", email))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.lock().unwrap();
        match tables.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn create_book(&self, book: Book) -> PortResult<Book> {
        self.tables.lock().unwrap().books.push(book.clone());
        Ok(book)
    }

    async fn get_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Book> {
        let tables = self.tables.lock().unwrap();
        tables
            .books
            .iter()
            .find(|b| b.id == book_id && b.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Book", book_id))
    }

    async fn find_book_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> PortResult<Option<Book>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .books
            .iter()
            .find(|b| b.user_id == user_id && b.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn list_books(&self, user_id: Uuid) -> PortResult<Vec<Book>> {
        let tables = self.tables.lock().unwrap();
        let mut books: Vec<Book> = tables
            .books
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        books.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(books)
    }

    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.books.retain(|b| !(b.id == book_id && b.user_id == user_id));
        tables.progress.retain(|p| p.book_id != book_id);
        tables.reviews.retain(|r| r.book_id != book_id);
        tables.links.retain(|l| l.book_id != book_id);
        Ok(())
    }

    async fn create_progress(&self, progress: ReadingProgress) -> PortResult<ReadingProgress> {
        self.tables.lock().unwrap().progress.push(progress.clone());
        Ok(progress)
    }

    async fn get_progress(&self, user_id: Uuid, book_id: Uuid) -> PortResult<ReadingProgress> {
        if self.progress_unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("progress store offline".to_string()));
        }
        let tables = self.tables.lock().unwrap();
        tables
            .progress
            .iter()
            .find(|p| p.book_id == book_id && p.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Progress for book", book_id))
    }

    async fn save_progress(&self, progress: &ReadingProgress) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .progress
            .iter_mut()
            .find(|p| p.id == progress.id)
            .ok_or_else(|| not_found("Progress", progress.id))?;
        *row = progress.clone();
        Ok(())
    }

    async fn list_progress(
        &self,
        user_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<Vec<ReadingProgress>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ReadingProgress> = tables
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(rows)
    }

    async fn upsert_review(&self, review: Review) -> PortResult<Review> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .reviews
            .iter_mut()
            .find(|r| r.user_id == review.user_id && r.book_id == review.book_id)
        {
            existing.rating = review.rating;
            existing.review_text = review.review_text;
            existing.updated_at = review.updated_at;
            return Ok(existing.clone());
        }
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(reviews)
    }

    async fn create_challenge(&self, challenge: Challenge) -> PortResult<Challenge> {
        self.tables.lock().unwrap().challenges.push(challenge.clone());
        Ok(challenge)
    }

    async fn get_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<Challenge> {
        let tables = self.tables.lock().unwrap();
        tables
            .challenges
            .iter()
            .find(|c| c.id == challenge_id && c.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Challenge", challenge_id))
    }

    async fn update_challenge(&self, challenge: &Challenge) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .challenges
            .iter_mut()
            .find(|c| c.id == challenge.id)
            .ok_or_else(|| not_found("Challenge", challenge.id))?;
        *row = challenge.clone();
        Ok(())
    }

    async fn delete_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.links.retain(|l| l.challenge_id != challenge_id);
        tables
            .challenges
            .retain(|c| !(c.id == challenge_id && c.user_id == user_id));
        Ok(())
    }

    async fn list_challenges(&self, user_id: Uuid, completed: bool) -> PortResult<Vec<Challenge>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Challenge> = tables
            .challenges
            .iter()
            .filter(|c| c.user_id == user_id && c.completed == completed)
            .cloned()
            .collect();
        if completed {
            rows.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        } else {
            rows.sort_by(|a, b| a.end_date.cmp(&b.end_date));
        }
        Ok(rows)
    }

    async fn list_challenge_books(&self, challenge_id: Uuid) -> PortResult<Vec<ChallengeBook>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ChallengeBook> = tables
            .links
            .iter()
            .filter(|l| l.challenge_id == challenge_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(rows)
    }

    async fn link_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<LinkOutcome> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .links
            .iter()
            .any(|l| l.challenge_id == challenge_id && l.book_id == book_id)
        {
            return Ok(LinkOutcome::AlreadyPresent);
        }
        tables.links.push(ChallengeBook {
            challenge_id,
            book_id,
            date_added: now,
        });
        let linked = tables
            .links
            .iter()
            .filter(|l| l.challenge_id == challenge_id)
            .count();
        let challenge = tables
            .challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or_else(|| not_found("Challenge", challenge_id))?;
        challenge.record_link(linked);
        Ok(LinkOutcome::Linked {
            completed: challenge.completed,
        })
    }

    async fn unlink_challenge_book(
        &self,
        challenge_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<UnlinkOutcome> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.links.len();
        tables
            .links
            .retain(|l| !(l.challenge_id == challenge_id && l.book_id == book_id));
        if tables.links.len() == before {
            return Ok(UnlinkOutcome::NotLinked);
        }
        if let Some(challenge) = tables.challenges.iter_mut().find(|c| c.id == challenge_id) {
            challenge.record_unlink();
        }
        Ok(UnlinkOutcome::Removed)
    }
}
