#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    DeckCatalog, InMemoryRepository, ProgressRepository, ReviewLogRepository, ReviewPersistence,
    SessionSummaryRecord, SessionSummaryRepository, SessionSummaryRow, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
