// SQLite implementation of the document store - documents as JSON rows in
// a single table, filtered with json_extract.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::{AppError, AppResult};
use crate::storage::{sort_and_limit, DocumentQuery, DocumentStore, SortDirection};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// In-memory database, one connection so every query sees the same db.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// File-backed database, e.g. `sqlite:data/wallgraph.db?mode=rwc`.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to connect to SQLite at {}: {}", url, e))
        })?;
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_wall
             ON documents(collection, json_extract(data, '$.wall_id'))",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create wall index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get document {}: {}", id, e)))?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                let document = serde_json::from_str(&data).map_err(|e| {
                    AppError::SerializationError(format!("Corrupt document {}: {}", id, e))
                })?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        let data = serde_json::to_string(&document).map_err(|e| {
            AppError::SerializationError(format!("Failed to encode document {}: {}", id, e))
        })?;
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)
             ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to put document {}: {}", id, e)))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete document {}: {}", id, e))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, collection: &str, query: DocumentQuery) -> AppResult<Vec<Value>> {
        // String filters (wall_id and the other id fields) are pushed into
        // SQL; anything else is applied to the decoded documents.
        let mut sql = "SELECT data FROM documents WHERE collection = ?".to_string();
        let mut bound: Vec<String> = Vec::new();
        for filter in &query.filters {
            if let Value::String(s) = &filter.value {
                sql.push_str(&format!(
                    " AND json_extract(data, '$.{}') = ?",
                    filter.field
                ));
                bound.push(s.clone());
            }
        }
        if let Some((field, direction)) = &query.order_by {
            sql.push_str(&format!(" ORDER BY json_extract(data, '$.{}')", field));
            if *direction == SortDirection::Descending {
                sql.push_str(" DESC");
            }
        }

        let mut query_builder = sqlx::query(&sql).bind(collection);
        for value in &bound {
            query_builder = query_builder.bind(value.as_str());
        }

        let rows = query_builder
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to query documents: {}", e)))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.get("data");
            let document: Value = serde_json::from_str(&data)
                .map_err(|e| AppError::SerializationError(format!("Corrupt document: {}", e)))?;
            if query.matches(&document) {
                documents.push(document);
            }
        }
        // Re-sorting is a no-op for SQL-ordered results; it also covers the
        // limit, which must apply after the non-string filters.
        Ok(sort_and_limit(documents, &query))
    }
}
