use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The SQLite file could not be opened or the schema could not be created
    #[error("Local storage is unavailable: {0}")]
    Unavailable(String),

    /// A write (bulk insert, profile save) failed and was rolled back
    #[error("Failed to write to local storage: {0}")]
    Write(#[source] sqlx::Error),

    /// A read query failed
    #[error("Menu query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored JSON record could not be encoded or decoded
    #[error("Stored record is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Classify a connection-time sqlx error.
    ///
    /// Anything that fails before the schema exists means the store cannot
    /// be used at all, so every variant collapses into `Unavailable`.
    pub(crate) fn from_open(err: sqlx::Error) -> Self {
        tracing::warn!(error = %err, "SQLite store could not be opened");
        DatabaseError::Unavailable(err.to_string())
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// One dish on the menu.
///
/// Rows are immutable once imported: the store only ever bulk-inserts them on
/// first population and never updates or deletes individual items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

impl MenuItem {
    /// Resolve the image reference against the remote image folder.
    ///
    /// References that are already absolute URIs are returned as-is.
    pub fn image_url(&self, base: &str) -> String {
        if self.image.starts_with("http://") || self.image.starts_with("https://") {
            return self.image.clone();
        }
        format!("{}/{}?raw=true", base.trim_end_matches('/'), self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(image: &str) -> MenuItem {
        MenuItem {
            id: 1,
            name: "Greek Salad".to_string(),
            price: 12.99,
            description: String::new(),
            image: image.to_string(),
            category: "starters".to_string(),
        }
    }

    #[test]
    fn test_image_url_joins_base() {
        let url = item("greekSalad.jpg").image_url("https://example.com/images/");
        assert_eq!(url, "https://example.com/images/greekSalad.jpg?raw=true");
    }

    #[test]
    fn test_image_url_keeps_absolute_uri() {
        let url = item("https://cdn.example.com/a.jpg").image_url("https://example.com/images");
        assert_eq!(url, "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_unavailable_message() {
        let err = DatabaseError::Unavailable("disk gone".to_string());
        assert!(err.to_string().contains("unavailable"));
    }
}
