pub mod catalog;
pub mod challenge;
pub mod domain;
pub mod ports;
pub mod progress;
pub mod relevance;
pub mod search;
pub mod tracker;
pub mod views;

pub use domain::{
    Book, CatalogEntry, Challenge, ChallengeBook, ChallengeProgress, LinkOutcome,
    NewBook, ProgressType, ReadingProgress, ReadingStats, ReadingStatus, Review, UnlinkOutcome,
    User, UserCredentials,
};
pub use ports::{AccountDirectory, CatalogProvider, DatabaseService, PortError, PortResult};
pub use search::CatalogSearch;
pub use tracker::ReadingTracker;
