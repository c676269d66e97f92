use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    // ========================================================================
    // Key-Value Operations
    // ========================================================================

    /// Get a single value by key.
    ///
    /// Keys use dotted convention: `profile`, `menu.imported_at`, etc.
    ///
    /// # Returns
    ///
    /// The stored value if the key exists, or `None` if not set.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a value (UPSERT).
    ///
    /// Inserts the key-value pair if it doesn't exist, or overwrites the value
    /// and timestamp if the key already exists.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Write)?;

        Ok(())
    }

    /// Remove a key. Removing a missing key is not an error.
    pub async fn remove_value(&self, key: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_value_missing() {
        let db = test_db().await;
        let value = db.get_value("nonexistent.key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_value_upsert() {
        let db = test_db().await;
        db.set_value("profile", "{}").await.unwrap();
        db.set_value("profile", "{\"a\":1}").await.unwrap();

        let value = db.get_value("profile").await.unwrap();
        assert_eq!(value, Some("{\"a\":1}".to_string()));
    }

    #[tokio::test]
    async fn test_remove_value() {
        let db = test_db().await;
        db.set_value("profile", "{}").await.unwrap();
        db.remove_value("profile").await.unwrap();
        assert_eq!(db.get_value("profile").await.unwrap(), None);

        // Second removal is a no-op
        db.remove_value("profile").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_value_records_timestamp() {
        let db = test_db().await;
        db.set_value("test.key", "value1").await.unwrap();

        let row: (String,) = sqlx::query_as("SELECT updated_at FROM kv_store WHERE key = ?")
            .bind("test.key")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert!(!row.0.is_empty());
    }
}
