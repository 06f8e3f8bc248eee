pub mod db;
pub mod google_books;

pub use db::DbAdapter;
pub use google_books::GoogleBooksAdapter;
