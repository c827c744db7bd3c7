use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A manufacturing process (e.g. milling, anodizing) that equipment can
/// perform and cards can require.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Process {
    pub id: Uuid,
    pub name: String,
    #[ts(optional)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new process
#[derive(Debug, Deserialize, TS)]
pub struct CreateProcess {
    pub name: String,
    pub description: Option<String>,
}

/// Request to update an existing process
#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateProcess {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request to set process associations (replaces existing)
#[derive(Debug, Deserialize, TS)]
pub struct SetProcesses {
    pub process_ids: Vec<Uuid>,
}

const PROCESS_COLUMNS: &str = "id, name, description, created_at, updated_at";

impl Process {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PROCESS_COLUMNS} FROM processes ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PROCESS_COLUMNS} FROM processes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateProcess) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO processes (id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {PROCESS_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateProcess,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = data.name.as_ref().unwrap_or(&existing.name);
        let description = data.description.as_ref().or(existing.description.as_ref());

        sqlx::query_as::<_, Self>(&format!(
            "UPDATE processes
             SET name = $2, description = $3, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {PROCESS_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM processes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Get all processes associated with an equipment item
    pub async fn find_for_equipment(
        pool: &SqlitePool,
        equipment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT p.id, p.name, p.description, p.created_at, p.updated_at
             FROM processes p
             INNER JOIN equipment_processes ep ON p.id = ep.process_id
             WHERE ep.equipment_id = $1
             ORDER BY p.name ASC",
        )
        .bind(equipment_id)
        .fetch_all(pool)
        .await
    }

    /// Get all processes associated with a card
    pub async fn find_for_card(pool: &SqlitePool, card_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT p.id, p.name, p.description, p.created_at, p.updated_at
             FROM processes p
             INNER JOIN card_processes cp ON p.id = cp.process_id
             WHERE cp.card_id = $1
             ORDER BY p.name ASC",
        )
        .bind(card_id)
        .fetch_all(pool)
        .await
    }
}
