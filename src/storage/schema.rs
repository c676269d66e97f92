use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Unavailable` if the file cannot be opened or
    /// the tables cannot be created.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let db = Self::connect(path).await?;
        db.initialize().await?;
        Ok(db)
    }

    /// Open the connection pool without touching the schema.
    ///
    /// Used by the startup sequence, which runs [`Database::initialize`] as
    /// its own step.
    pub async fn connect(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // Pre-create the file user-only so the menu cache and profile are never world-readable
        #[cfg(unix)]
        if path != ":memory:" {
            let db_path = std::path::Path::new(path);
            if !db_path.exists() && db_path.parent().is_some_and(|p| p.exists()) {
                use std::os::unix::fs::OpenOptionsExt;
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok(); // If creation fails, SQLite will report the error at connect_with.
            }
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_open)?
            .pragma("busy_timeout", "5000");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_open)?;

        tracing::debug!(path = %path, "Opened SQLite pool");
        Ok(Self { pool })
    }

    /// Idempotently create the menu and key/value tables.
    ///
    /// All statements use `IF NOT EXISTS` and run in one transaction, so
    /// calling this on an existing database is a no-op.
    pub async fn initialize(&self) -> Result<(), DatabaseError> {
        self.migrate()
            .await
            .map_err(|e| DatabaseError::Unavailable(format!("schema setup failed: {e}")))
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS menu (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_menu_category ON menu(category)")
            .execute(&mut *tx)
            .await?;

        // Key-value store for the profile record and cache metadata
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.initialize().await.unwrap();
        db.initialize().await.unwrap();
        assert!(db.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_open_missing_directory_is_unavailable() {
        let result = Database::open("/nonexistent-little-lemon-dir/sub/menu.db").await;
        assert!(matches!(result, Err(DatabaseError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_connect_then_initialize() {
        let db = Database::connect(":memory:").await.unwrap();
        db.initialize().await.unwrap();
        assert!(db.is_empty().await.unwrap());
    }
}
