//! SQLite-backed document store

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::store::{Document, DocumentStore, InsertOutcome};
use crate::{Error, Result};

/// Document collections stored in the `documents` table
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = ? ORDER BY rowid ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                let body: Value = serde_json::from_str(&body).map_err(|e| {
                    Error::Internal(format!("Corrupt document {}/{}: {}", collection, id, e))
                })?;
                Ok(Document { id, body })
            })
            .collect()
    }

    async fn insert(&self, collection: &str, id: &str, body: &Value) -> Result<()> {
        let body = serde_json::to_string(body)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id)
            .bind(&body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
        unique_key: &str,
    ) -> Result<InsertOutcome> {
        let body = serde_json::to_string(body)?;
        // Only a unique_key collision is absorbed; an id collision still errors
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, unique_key, body)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, unique_key) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(unique_key)
        .bind(&body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Conflict)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}
