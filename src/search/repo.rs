use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// One submitted search query. Rows are append-only: nothing in the core
/// updates or deletes them, retrieval is the only read path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub query: String,
    pub created_at: OffsetDateTime,
}

/// Trims the query; a blank result is a validation failure.
pub fn normalize_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Query required".into()));
    }
    Ok(trimmed)
}

/// Appends one entry. Never deduplicates and never caps stored volume;
/// bounding happens at retrieval.
pub async fn record(db: &PgPool, user_id: Uuid, query: &str) -> Result<(), ApiError> {
    let query = normalize_query(query)?;
    sqlx::query(
        r#"
        INSERT INTO search_history (user_id, query)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(query)
    .execute(db)
    .await?;
    Ok(())
}

/// Most recent entries for a user, newest first. Timestamp ties fall back
/// to the serial id, so equal-timestamp rows come back in reverse insertion
/// order.
pub async fn recent(db: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<HistoryEntry>, ApiError> {
    let rows = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT id, user_id, query, created_at
        FROM search_history
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
