mod common;

use booktracker_core::views::{ChallengeInput, LibraryFilter, ReadingUpdate};
use booktracker_core::{
    CatalogSearch, DatabaseService, LinkOutcome, NewBook, PortError, ProgressType,
    ReadingStatus, ReadingTracker, UnlinkOutcome,
};
use chrono::Duration;
use common::{fixed_now, volume, MemoryDb, ScriptedCatalog};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    db: Arc<MemoryDb>,
    tracker: ReadingTracker,
    user: Uuid,
}

async fn fixture() -> Fixture {
    let db = Arc::new(MemoryDb::default());
    let catalog = Arc::new(ScriptedCatalog::with(vec![
        volume("dune", "Dune", &["Frank Herbert"], Some("Desert planet")),
        volume("hobbit", "The Hobbit", &["J.R.R. Tolkien"], None),
    ]));
    let tracker =
        ReadingTracker::new(db.clone(), CatalogSearch::new(catalog)).with_clock(fixed_now);
    let user = db
        .create_user("reader", "reader@example.com", "hash")
        .await
        .unwrap()
        .user_id;
    Fixture { db, tracker, user }
}

fn manual(title: &str) -> NewBook {
    NewBook {
        title: title.to_string(),
        authors: "Some Author".to_string(),
        categories: Some("Fiction, Mystery".to_string()),
        average_rating: Some(4.0),
        ..Default::default()
    }
}

fn finish() -> ReadingUpdate {
    ReadingUpdate {
        status: Some(ReadingStatus::Finished),
        ..Default::default()
    }
}

async fn finished_books(f: &Fixture, n: usize) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for i in 0..n {
        let book = f.tracker.add_manual(f.user, manual(&format!("Book {}", i))).await.unwrap();
        f.tracker.update_reading(f.user, book.id, finish()).await.unwrap();
        ids.push(book.id);
    }
    ids
}

async fn challenge(f: &Fixture, goal: i32) -> Uuid {
    f.tracker
        .create_challenge(
            f.user,
            ChallengeInput {
                title: "Summer".to_string(),
                description: None,
                goal,
                end_date: fixed_now() + Duration::days(30),
            },
        )
        .await
        .unwrap()
        .id
}

//=========================================================================================
// Library
//=========================================================================================

#[tokio::test]
async fn adding_from_catalog_creates_book_and_progress() {
    let f = fixture().await;

    let added = f.tracker.add_from_catalog(f.user, "dune").await.unwrap();
    assert!(!added.already_present);
    assert_eq!(added.book.title, "Dune");
    assert_eq!(added.book.authors, "Frank Herbert");
    assert_eq!(added.book.categories.as_deref(), Some("Fiction"));

    let progress = f.db.get_progress(f.user, added.book.id).await.unwrap();
    assert_eq!(progress.status, ReadingStatus::WantToRead);
}

#[tokio::test]
async fn adding_the_same_volume_twice_reports_existing_book() {
    let f = fixture().await;
    let first = f.tracker.add_from_catalog(f.user, "dune").await.unwrap();
    let second = f.tracker.add_from_catalog(f.user, "dune").await.unwrap();

    assert!(second.already_present);
    assert_eq!(second.book.id, first.book.id);
    assert_eq!(f.db.list_books(f.user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_catalog_volume_is_not_found() {
    let f = fixture().await;
    let err = f.tracker.add_from_catalog(f.user, "missing").await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn manual_book_is_validated() {
    let f = fixture().await;
    let mut book = manual("Valid");
    book.page_count = Some(0);
    let err = f.tracker.add_manual(f.user, book).await.unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
}

#[tokio::test]
async fn library_filters_by_status_category_and_rating() {
    let f = fixture().await;
    let mystery = f.tracker.add_manual(f.user, manual("Mystery One")).await.unwrap();
    let mut low = manual("Low Rated");
    low.categories = Some("History".to_string());
    low.average_rating = Some(2.0);
    f.tracker.add_manual(f.user, low).await.unwrap();
    f.tracker.update_reading(f.user, mystery.id, finish()).await.unwrap();

    let all = f.tracker.library(f.user, &LibraryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let finished = LibraryFilter {
        status: Some(ReadingStatus::Finished),
        ..Default::default()
    };
    let items = f.tracker.library(f.user, &finished).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].book.id, mystery.id);

    let history = LibraryFilter {
        category: Some("History".to_string()),
        ..Default::default()
    };
    assert_eq!(f.tracker.library(f.user, &history).await.unwrap().len(), 1);

    let rated = LibraryFilter {
        min_rating: Some(3.0),
        ..Default::default()
    };
    let items = f.tracker.library(f.user, &rated).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].book.title, "Mystery One");

    let categories = f.tracker.library_categories(f.user).await.unwrap();
    assert_eq!(categories, vec!["Fiction", "History", "Mystery"]);
}

#[tokio::test]
async fn other_users_cannot_see_books() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Private")).await.unwrap();
    let stranger = Uuid::new_v4();

    let err = f.tracker.book_detail(stranger, book.id).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
    let err = f.tracker.delete_book(stranger, book.id).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_book_removes_its_progress() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Gone")).await.unwrap();
    f.tracker.delete_book(f.user, book.id).await.unwrap();

    assert!(f.db.get_progress(f.user, book.id).await.is_err());
    assert!(f.tracker.library(f.user, &LibraryFilter::default()).await.unwrap().is_empty());
}

//=========================================================================================
// Progress and Reviews
//=========================================================================================

#[tokio::test]
async fn full_percentage_finishes_the_book() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Read Me")).await.unwrap();
    let update = ReadingUpdate {
        progress: Some(100),
        progress_type: Some(ProgressType::Percentage),
        ..Default::default()
    };

    let record = f.tracker.update_reading(f.user, book.id, update.clone()).await.unwrap();
    assert_eq!(record.status, ReadingStatus::Finished);
    assert_eq!(record.end_date, Some(fixed_now()));

    let again = f.tracker.update_reading(f.user, book.id, update).await.unwrap();
    assert_eq!(again.end_date, Some(fixed_now()));
    assert_eq!(f.db.get_progress(f.user, book.id).await.unwrap(), again);
}

#[tokio::test]
async fn status_then_progress_are_applied_in_order() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Paged")).await.unwrap();
    let update = ReadingUpdate {
        status: Some(ReadingStatus::Reading),
        progress: Some(250),
        progress_type: Some(ProgressType::Page),
    };

    let record = f.tracker.update_reading(f.user, book.id, update).await.unwrap();
    assert_eq!(record.status, ReadingStatus::Reading);
    assert_eq!(record.progress, 250);
    assert_eq!(record.progress_type, ProgressType::Page);
    assert_eq!(record.start_date, Some(fixed_now()));
}

#[tokio::test]
async fn percentage_above_100_is_rejected() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Too Far")).await.unwrap();
    let update = ReadingUpdate {
        progress: Some(120),
        ..Default::default()
    };
    let err = f.tracker.update_reading(f.user, book.id, update).await.unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
}

#[tokio::test]
async fn finishing_with_partial_percentage_in_one_request_is_rejected() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Half Done")).await.unwrap();
    let update = ReadingUpdate {
        status: Some(ReadingStatus::Finished),
        progress: Some(40),
        progress_type: Some(ProgressType::Percentage),
    };

    let err = f.tracker.update_reading(f.user, book.id, update).await.unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
    let stored = f.db.get_progress(f.user, book.id).await.unwrap();
    assert_eq!(stored.status, ReadingStatus::WantToRead);
    assert_eq!(stored.progress, 0);
}

#[tokio::test]
async fn refinishing_a_reread_book_restores_full_percentage() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Reread")).await.unwrap();
    f.tracker.update_reading(f.user, book.id, finish()).await.unwrap();
    let reread = ReadingUpdate {
        status: Some(ReadingStatus::Reading),
        progress: Some(40),
        ..Default::default()
    };
    let record = f.tracker.update_reading(f.user, book.id, reread).await.unwrap();
    assert_eq!(record.status, ReadingStatus::Reading);
    assert_eq!(record.progress, 40);

    let record = f.tracker.update_reading(f.user, book.id, finish()).await.unwrap();
    assert_eq!(record.status, ReadingStatus::Finished);
    assert_eq!(record.progress, 100);
    assert_eq!(f.db.get_progress(f.user, book.id).await.unwrap().progress, 100);
}

#[tokio::test]
async fn review_is_upserted_and_averaged() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Reviewed")).await.unwrap();

    f.tracker
        .submit_review(f.user, book.id, 2, Some("meh".to_string()))
        .await
        .unwrap();
    f.tracker
        .submit_review(f.user, book.id, 5, Some("grew on me".to_string()))
        .await
        .unwrap();

    let detail = f.tracker.book_detail(f.user, book.id).await.unwrap();
    let review = detail.review.expect("own review");
    assert_eq!(review.rating, 5);
    assert_eq!(review.review_text.as_deref(), Some("grew on me"));
    assert!(detail.other_reviews.is_empty());
    assert_eq!(detail.average_user_rating, 5.0);
}

#[tokio::test]
async fn review_rating_must_be_one_to_five() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Unrated")).await.unwrap();
    for rating in [0, 6] {
        let err = f.tracker.submit_review(f.user, book.id, rating, None).await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
    }
}

//=========================================================================================
// Challenges
//=========================================================================================

#[tokio::test]
async fn goal_th_book_completes_the_challenge() {
    let f = fixture().await;
    let books = finished_books(&f, 10).await;
    let challenge_id = challenge(&f, 10).await;

    for book in &books[..9] {
        let outcome = f.tracker.add_book_to_challenge(f.user, challenge_id, *book).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Linked { completed: false });
    }
    let outcome = f
        .tracker
        .add_book_to_challenge(f.user, challenge_id, books[9])
        .await
        .unwrap();
    assert_eq!(outcome, LinkOutcome::Linked { completed: true });
    assert!(f.db.challenge(challenge_id).completed);

    let removed = f
        .tracker
        .remove_book_from_challenge(f.user, challenge_id, books[3])
        .await
        .unwrap();
    assert_eq!(removed, UnlinkOutcome::Removed);
    assert!(!f.db.challenge(challenge_id).completed);
}

#[tokio::test]
async fn removing_a_book_clears_completed_even_above_goal() {
    let f = fixture().await;
    let books = finished_books(&f, 6).await;
    let challenge_id = challenge(&f, 5).await;
    for book in &books {
        f.tracker.add_book_to_challenge(f.user, challenge_id, *book).await.unwrap();
    }
    assert!(f.db.challenge(challenge_id).completed);

    f.tracker
        .remove_book_from_challenge(f.user, challenge_id, books[0])
        .await
        .unwrap();

    // Five linked books still meet the goal of five; the flag is cleared anyway.
    assert_eq!(f.db.link_count(challenge_id), 5);
    assert!(!f.db.challenge(challenge_id).completed);
}

#[tokio::test]
async fn linking_twice_is_reported_not_failed() {
    let f = fixture().await;
    let books = finished_books(&f, 1).await;
    let challenge_id = challenge(&f, 3).await;

    f.tracker.add_book_to_challenge(f.user, challenge_id, books[0]).await.unwrap();
    let outcome = f
        .tracker
        .add_book_to_challenge(f.user, challenge_id, books[0])
        .await
        .unwrap();
    assert_eq!(outcome, LinkOutcome::AlreadyPresent);
    assert_eq!(f.db.link_count(challenge_id), 1);
}

#[tokio::test]
async fn unlinking_an_unlinked_book_is_reported() {
    let f = fixture().await;
    let books = finished_books(&f, 1).await;
    let challenge_id = challenge(&f, 3).await;

    let outcome = f
        .tracker
        .remove_book_from_challenge(f.user, challenge_id, books[0])
        .await
        .unwrap();
    assert_eq!(outcome, UnlinkOutcome::NotLinked);
}

#[tokio::test]
async fn only_finished_books_can_be_linked() {
    let f = fixture().await;
    let book = f.tracker.add_manual(f.user, manual("Unread")).await.unwrap();
    let challenge_id = challenge(&f, 3).await;

    let err = f
        .tracker
        .add_book_to_challenge(f.user, challenge_id, book.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
    assert_eq!(f.db.link_count(challenge_id), 0);
}

#[tokio::test]
async fn progress_store_failure_is_not_reported_as_unfinished() {
    let f = fixture().await;
    let ids = finished_books(&f, 1).await;
    let challenge_id = challenge(&f, 3).await;
    f.db.make_progress_unavailable();

    let err = f
        .tracker
        .add_book_to_challenge(f.user, challenge_id, ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Unavailable(_)));
    assert_eq!(f.db.link_count(challenge_id), 0);
}

#[tokio::test]
async fn challenge_detail_reports_progress_and_candidates() {
    let f = fixture().await;
    let books = finished_books(&f, 3).await;
    f.tracker.add_manual(f.user, manual("Not finished")).await.unwrap();
    let challenge_id = challenge(&f, 10).await;
    f.tracker.add_book_to_challenge(f.user, challenge_id, books[0]).await.unwrap();

    let detail = f.tracker.challenge_detail(f.user, challenge_id).await.unwrap();
    assert_eq!(detail.overview.progress.completed, 1);
    assert_eq!(detail.overview.progress.percentage, 10);
    assert_eq!(detail.overview.days_left, 30);
    assert_eq!(detail.overview.time_progress, 0);
    assert_eq!(detail.books.len(), 1);
    assert_eq!(detail.books[0].book.id, books[0]);

    let mut candidates: Vec<Uuid> = detail.candidates.iter().map(|b| b.id).collect();
    let mut expected = vec![books[1], books[2]];
    candidates.sort();
    expected.sort();
    assert_eq!(candidates, expected);
}

#[tokio::test]
async fn challenge_validation() {
    let f = fixture().await;
    let past = ChallengeInput {
        title: "Past".to_string(),
        description: None,
        goal: 3,
        end_date: fixed_now() - Duration::days(1),
    };
    let err = f.tracker.create_challenge(f.user, past).await.unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));

    let zero = ChallengeInput {
        title: "Zero".to_string(),
        description: None,
        goal: 0,
        end_date: fixed_now() + Duration::days(10),
    };
    let err = f.tracker.create_challenge(f.user, zero).await.unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
}

#[tokio::test]
async fn completed_challenges_cannot_be_edited() {
    let f = fixture().await;
    let books = finished_books(&f, 1).await;
    let challenge_id = challenge(&f, 1).await;
    f.tracker.add_book_to_challenge(f.user, challenge_id, books[0]).await.unwrap();

    let edit = ChallengeInput {
        title: "Renamed".to_string(),
        description: None,
        goal: 4,
        end_date: fixed_now() + Duration::days(60),
    };
    let err = f
        .tracker
        .update_challenge(f.user, challenge_id, edit)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));
}

#[tokio::test]
async fn challenges_are_listed_by_completion() {
    let f = fixture().await;
    let books = finished_books(&f, 1).await;
    let done = challenge(&f, 1).await;
    let open = challenge(&f, 5).await;
    f.tracker.add_book_to_challenge(f.user, done, books[0]).await.unwrap();

    let list = f.tracker.list_challenges(f.user).await.unwrap();
    assert_eq!(list.active.len(), 1);
    assert_eq!(list.active[0].challenge.id, open);
    assert_eq!(list.completed.len(), 1);
    assert_eq!(list.completed[0].challenge.id, done);
    assert_eq!(list.completed[0].progress.percentage, 100);

    f.tracker.delete_challenge(f.user, done).await.unwrap();
    let list = f.tracker.list_challenges(f.user).await.unwrap();
    assert!(list.completed.is_empty());
}

//=========================================================================================
// Statistics
//=========================================================================================

#[tokio::test]
async fn stats_count_each_status() {
    let f = fixture().await;
    finished_books(&f, 2).await;
    let reading = f.tracker.add_manual(f.user, manual("Reading")).await.unwrap();
    f.tracker
        .update_reading(
            f.user,
            reading.id,
            ReadingUpdate {
                progress: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    f.tracker.add_manual(f.user, manual("Someday")).await.unwrap();

    let stats = f.tracker.reading_stats(f.user).await.unwrap();
    assert_eq!(stats.read, 2);
    assert_eq!(stats.reading, 1);
    assert_eq!(stats.to_read, 1);
    assert_eq!(stats.total, 4);

    let dashboard = f.tracker.dashboard(f.user).await.unwrap();
    assert_eq!(dashboard.current_books.len(), 1);
    assert_eq!(dashboard.current_books[0].book.id, reading.id);
    assert_eq!(dashboard.stats, stats);
}

#[tokio::test]
async fn profile_stats_cover_recent_monthly_and_top_rated() {
    let f = fixture().await;
    let books = finished_books(&f, 6).await;
    f.tracker.submit_review(f.user, books[0], 3, None).await.unwrap();
    f.tracker.submit_review(f.user, books[1], 5, None).await.unwrap();
    challenge(&f, 12).await;

    let profile = f.tracker.profile_stats(f.user, 2024).await.unwrap();
    assert_eq!(profile.stats.read, 6);
    assert_eq!(profile.recent_books.len(), 5);
    assert_eq!(profile.monthly.len(), 12);
    assert_eq!(profile.monthly[5].month, "Jun");
    assert_eq!(profile.monthly[5].count, 6);
    assert_eq!(profile.top_rated.len(), 2);
    assert_eq!(profile.top_rated[0].id, books[1]);
    assert_eq!(profile.active_challenges.len(), 1);
}
