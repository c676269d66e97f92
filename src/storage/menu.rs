use sqlx::QueryBuilder;
use std::collections::BTreeSet;

use super::schema::Database;
use super::types::{DatabaseError, MenuItem};

/// Key under which the time of the first population is recorded.
const IMPORTED_AT_KEY: &str = "menu.imported_at";

impl Database {
    // ========================================================================
    // Menu Operations
    // ========================================================================

    /// True iff no menu rows have ever been inserted.
    pub async fn is_empty(&self) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM menu LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        Ok(row.is_none())
    }

    /// Number of stored menu rows.
    pub async fn menu_count(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        Ok(row.0)
    }

    /// Insert every item in a single transaction.
    ///
    /// Ids come from the caller. On any failure the transaction is rolled back
    /// and no subset of `items` is committed.
    pub async fn bulk_insert(&self, items: &[MenuItem]) -> Result<(), DatabaseError> {
        if items.is_empty() {
            return Ok(());
        }

        // Stay well under SQLite's bind-parameter limit (6 binds per row)
        const BATCH_SIZE: usize = 100;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Write)?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT INTO menu (id, name, price, description, image, category) ",
            );

            builder.push_values(chunk, |mut b, item| {
                b.push_bind(item.id)
                    .push_bind(&item.name)
                    .push_bind(item.price)
                    .push_bind(&item.description)
                    .push_bind(&item.image)
                    .push_bind(&item.category);
            });

            // Dropping `tx` on the error path rolls the whole batch back
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::Write)?;
        }

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(IMPORTED_AT_KEY)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::Write)?;

        tx.commit().await.map_err(DatabaseError::Write)?;
        tracing::info!(count = items.len(), "Menu items stored");
        Ok(())
    }

    /// When the menu was first populated, if it has been.
    pub async fn menu_imported_at(
        &self,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, DatabaseError> {
        let value = self.get_value(IMPORTED_AT_KEY).await?;
        Ok(value
            .and_then(|v| chrono::DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)))
    }

    /// Every row whose name contains `search_text` (case-sensitive) and whose
    /// category is in `categories`, in ascending id order.
    ///
    /// An empty `search_text` matches every name. An empty `categories` set
    /// places no restriction on category.
    pub async fn query_menu(
        &self,
        search_text: &str,
        categories: &BTreeSet<String>,
    ) -> Result<Vec<MenuItem>, DatabaseError> {
        // instr() is case-sensitive, unlike LIKE, and instr(x, '') = 1
        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "SELECT id, name, price, description, image, category FROM menu WHERE instr(name, ",
        );
        builder.push_bind(search_text);
        builder.push(") > 0");

        if !categories.is_empty() {
            builder.push(" AND category IN (");
            let mut separated = builder.separated(", ");
            for category in categories {
                separated.push_bind(category);
            }
            separated.push_unseparated(")");
        }

        builder.push(" ORDER BY id ASC");

        let items: Vec<MenuItem> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        tracing::debug!(
            search = %search_text,
            categories = categories.len(),
            results = items.len(),
            "Menu query"
        );
        Ok(items)
    }
}
