use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Read-only mirror of Onshape identity data, refreshed at each login.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct OnshapeUser {
    /// Onshape user id (vendor-assigned opaque string)
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OnshapeUser {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, name, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert or refresh the vendor identity mirror.
    pub async fn upsert(pool: &SqlitePool, id: &str, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO users (id, name) VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE
             SET name = excluded.name, updated_at = datetime('now', 'subsec')
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
    }
}
