//! crates/booktracker_core/src/progress.rs
//!
//! Status and progress transitions for a `ReadingProgress` record.
//!
//! Both operations take the current time explicitly so the caller decides what
//! "now" is. Start and end timestamps are only ever stamped when unset, with one
//! exception: re-entering `reading` from `want_to_read` restarts the clock.

use crate::domain::{ProgressType, ReadingProgress, ReadingStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Percentage value that marks a book as fully read.
pub const COMPLETE_PERCENTAGE: i32 = 100;

impl ReadingProgress {
    /// A fresh `want_to_read` record, as created when a book enters the library.
    pub fn new(user_id: Uuid, book_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            status: ReadingStatus::WantToRead,
            progress: 0,
            progress_type: ProgressType::Percentage,
            start_date: None,
            end_date: None,
            last_updated: now,
        }
    }

    /// Records a new progress value, optionally switching the unit it is measured in.
    ///
    /// Reaching 100 percent finishes the book. Any positive progress on a book that
    /// was only wanted moves it to `reading`.
    pub fn update_progress(
        &mut self,
        progress: i32,
        progress_type: Option<ProgressType>,
        now: DateTime<Utc>,
    ) {
        self.progress = progress;
        if let Some(progress_type) = progress_type {
            self.progress_type = progress_type;
        }

        if self.is_complete_percentage() {
            self.status = ReadingStatus::Finished;
            if self.end_date.is_none() {
                self.end_date = Some(now);
            }
        } else if self.status == ReadingStatus::WantToRead && progress > 0 {
            self.status = ReadingStatus::Reading;
            if self.start_date.is_none() {
                self.start_date = Some(now);
            }
        }

        self.last_updated = now;
    }

    /// Moves the record to `status`, stamping start/end dates as needed.
    pub fn update_status(&mut self, status: ReadingStatus, now: DateTime<Utc>) {
        let old_status = self.status;
        self.status = status;

        match status {
            ReadingStatus::Reading
                if old_status == ReadingStatus::WantToRead || self.start_date.is_none() =>
            {
                self.start_date = Some(now);
            }
            ReadingStatus::Finished => {
                if self.end_date.is_none() {
                    self.end_date = Some(now);
                }
                if self.progress_type == ProgressType::Percentage {
                    self.progress = COMPLETE_PERCENTAGE;
                }
            }
            _ => {}
        }

        self.last_updated = now;
    }

    /// A finished book tracked in percent must sit at 100.
    pub fn is_consistent(&self) -> bool {
        self.status != ReadingStatus::Finished
            || self.progress_type != ProgressType::Percentage
            || self.progress == COMPLETE_PERCENTAGE
    }

    fn is_complete_percentage(&self) -> bool {
        self.progress == COMPLETE_PERCENTAGE && self.progress_type == ProgressType::Percentage
    }
}
