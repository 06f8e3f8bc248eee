//! crates/booktracker_core/src/challenge.rs
//!
//! Derived figures for reading challenges and the completion-flag rules applied
//! when books are linked or unlinked.

use crate::domain::{Challenge, ChallengeProgress};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days in `delta`, rounded towards negative infinity.
pub fn whole_days(delta: Duration) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// `floor(100 * completed / goal)`, or 0 for a non-positive goal.
pub fn percentage_of_goal(completed: usize, goal: i32) -> i64 {
    if goal <= 0 {
        return 0;
    }
    (100 * completed as i64) / i64::from(goal)
}

impl Challenge {
    pub fn new(
        user_id: Uuid,
        title: Option<String>,
        description: Option<String>,
        goal: i32,
        end_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            goal,
            start_date: now,
            end_date,
            completed: false,
            created_at: now,
        }
    }

    /// Progress towards the goal given the number of linked books.
    pub fn progress(&self, linked_books: usize) -> ChallengeProgress {
        ChallengeProgress {
            completed: linked_books,
            total: self.goal,
            percentage: percentage_of_goal(linked_books, self.goal),
        }
    }

    /// Share of the challenge window that has elapsed at `now`, 0 to 100.
    ///
    /// A window whose end does not come after its start counts as one day long.
    pub fn time_progress(&self, now: DateTime<Utc>) -> i64 {
        let days_total = whole_days(self.end_date - self.start_date).max(1);
        let days_passed = whole_days(now - self.start_date);
        (100 * days_passed).div_euclid(days_total).clamp(0, 100)
    }

    /// Days until the end date, never negative.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        whole_days(self.end_date - now).max(0)
    }

    /// Applies a successful link; `linked_books` is the count including the new book.
    pub fn record_link(&mut self, linked_books: usize) {
        if self.goal <= 0 || linked_books >= self.goal as usize {
            self.completed = true;
        }
    }

    /// Applies a successful unlink.
    ///
    /// The flag is cleared unconditionally, even when the remaining books still meet
    /// the goal; it is set again by the next link.
    pub fn record_unlink(&mut self) {
        self.completed = false;
    }
}
