//! Application-level error taxonomy.
//!
//! Every failure on the startup and search/filter paths is converted into an
//! [`AppError`] at the top of its async sequence and surfaced to the user as an
//! alert. Nothing is retried: each failure is terminal for that attempt.

use thiserror::Error;

use crate::menu::FetchError;
use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The local store could not be opened or created (fatal to startup)
    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Bulk insert failed; the store stays empty
    #[error("Failed to store menu: {0}")]
    StorageWrite(String),

    /// The remote menu could not be downloaded
    #[error("Network error: {0}")]
    Network(String),

    /// The remote menu document could not be decoded
    #[error("Invalid menu data: {0}")]
    Parse(String),

    /// A menu query failed; previously displayed data is kept
    #[error("Menu query failed: {0}")]
    Query(String),
}

impl AppError {
    /// Text for the blocking alert shown to the user.
    pub fn alert_message(&self) -> String {
        match self {
            AppError::StorageUnavailable(_) => {
                "Little Lemon could not open its local storage. Please restart the app.".to_string()
            }
            AppError::StorageWrite(_) => {
                "The menu could not be saved on this device. Please restart the app to try again."
                    .to_string()
            }
            AppError::Network(_) => {
                "The menu could not be downloaded. Check your connection and restart the app."
                    .to_string()
            }
            AppError::Parse(_) => {
                "The menu we received was not readable. Please try again later.".to_string()
            }
            AppError::Query(detail) => format!("Search failed: {detail}"),
        }
    }

    /// True for failures that leave the app unable to show any menu.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Unavailable(msg) => AppError::StorageUnavailable(msg),
            DatabaseError::Write(e) => AppError::StorageWrite(e.to_string()),
            DatabaseError::Query(e) => AppError::Query(e.to_string()),
            DatabaseError::Serialization(e) => AppError::Query(e.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Parse(msg) => AppError::Parse(msg),
            other => AppError::Network(other.to_string()),
        }
    }
}
