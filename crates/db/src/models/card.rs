use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A unit of manufacturing work tracked through the board columns.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct KanbanCard {
    pub id: Uuid,
    /// Opaque reference into the board config column list
    pub column_id: String,
    pub title: String,
    #[ts(optional)]
    pub image_url: Option<String>,
    #[ts(optional)]
    pub assignee: Option<String>,
    #[ts(optional)]
    pub material: Option<String>,
    #[ts(optional)]
    pub machine: Option<String>,
    #[ts(optional)]
    pub due_date: Option<DateTime<Utc>>,
    #[ts(optional)]
    pub content: Option<String>,
    /// Onshape user id of the creator
    #[ts(optional)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new card
#[derive(Debug, Deserialize, TS)]
pub struct CreateCard {
    pub column_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub assignee: Option<String>,
    pub material: Option<String>,
    pub machine: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub created_by: Option<String>,
}

/// Request to update an existing card. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateCard {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub assignee: Option<String>,
    pub material: Option<String>,
    pub machine: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

const CARD_COLUMNS: &str = "id, column_id, title, image_url, assignee, material, machine, \
     due_date, content, created_by, created_at, updated_at";

impl KanbanCard {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_column(
        pool: &SqlitePool,
        column_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE column_id = $1 ORDER BY created_at ASC"
        ))
        .bind(column_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateCard) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO cards (id, column_id, title, image_url, assignee, material, machine, \
             due_date, content, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.column_id)
        .bind(&data.title)
        .bind(&data.image_url)
        .bind(&data.assignee)
        .bind(&data.material)
        .bind(&data.machine)
        .bind(data.due_date)
        .bind(&data.content)
        .bind(&data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Update card fields. Absent fields keep their current value.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCard,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let title = data.title.as_ref().unwrap_or(&existing.title);
        let image_url = data.image_url.as_ref().or(existing.image_url.as_ref());
        let assignee = data.assignee.as_ref().or(existing.assignee.as_ref());
        let material = data.material.as_ref().or(existing.material.as_ref());
        let machine = data.machine.as_ref().or(existing.machine.as_ref());
        let due_date = data.due_date.or(existing.due_date);
        let content = data.content.as_ref().or(existing.content.as_ref());

        sqlx::query_as::<_, Self>(&format!(
            "UPDATE cards
             SET title = $2, image_url = $3, assignee = $4, material = $5, machine = $6,
                 due_date = $7, content = $8, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(image_url)
        .bind(assignee)
        .bind(material)
        .bind(machine)
        .bind(due_date)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// Move a card to another column. Touches only `column_id` and `updated_at`.
    pub async fn move_to_column(
        pool: &SqlitePool,
        id: Uuid,
        column_id: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE cards
             SET column_id = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(column_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Set processes for a card (replaces existing associations)
    pub async fn set_processes(
        pool: &SqlitePool,
        card_id: Uuid,
        process_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM card_processes WHERE card_id = $1")
            .bind(card_id)
            .execute(pool)
            .await?;

        for process_id in process_ids {
            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO card_processes (id, card_id, process_id) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(card_id)
                .bind(process_id)
                .execute(pool)
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;

    fn new_card(column_id: &str, title: &str) -> CreateCard {
        CreateCard {
            column_id: column_id.to_string(),
            title: title.to_string(),
            image_url: None,
            assignee: None,
            material: None,
            machine: None,
            due_date: None,
            content: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let (pool, _dir) = create_test_pool().await;

        let card = KanbanCard::create(&pool, &new_card("queue", "Drive rail"))
            .await
            .unwrap();
        assert_eq!(card.title, "Drive rail");
        assert_eq!(card.column_id, "queue");

        let found = KanbanCard::find_by_id(&pool, card.id).await.unwrap();
        assert_eq!(found.unwrap().id, card.id);

        let in_column = KanbanCard::find_by_column(&pool, "queue").await.unwrap();
        assert_eq!(in_column.len(), 1);
    }

    #[tokio::test]
    async fn move_changes_only_column_and_updated_at() {
        let (pool, _dir) = create_test_pool().await;

        let mut create = new_card("queue", "Gearbox plate");
        create.material = Some("7075".to_string());
        create.assignee = Some("sam".to_string());
        let card = KanbanCard::create(&pool, &create).await.unwrap();

        let moved = KanbanCard::move_to_column(&pool, card.id, "machining")
            .await
            .unwrap();
        assert_eq!(moved.column_id, "machining");
        assert_eq!(moved.title, card.title);
        assert_eq!(moved.material, card.material);
        assert_eq!(moved.assignee, card.assignee);
        assert_eq!(moved.created_at, card.created_at);
        assert!(moved.updated_at >= card.updated_at);
    }

    #[tokio::test]
    async fn partial_update_keeps_unset_fields() {
        let (pool, _dir) = create_test_pool().await;

        let mut create = new_card("queue", "Intake shaft");
        create.machine = Some("lathe".to_string());
        let card = KanbanCard::create(&pool, &create).await.unwrap();

        let update = UpdateCard {
            title: Some("Intake shaft v2".to_string()),
            ..Default::default()
        };
        let updated = KanbanCard::update(&pool, card.id, &update).await.unwrap();
        assert_eq!(updated.title, "Intake shaft v2");
        assert_eq!(updated.machine.as_deref(), Some("lathe"));
    }

    #[tokio::test]
    async fn update_missing_card_is_row_not_found() {
        let (pool, _dir) = create_test_pool().await;

        let err = KanbanCard::update(&pool, Uuid::new_v4(), &UpdateCard::default())
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn delete_reports_rows_affected() {
        let (pool, _dir) = create_test_pool().await;

        let card = KanbanCard::create(&pool, &new_card("queue", "Spacer"))
            .await
            .unwrap();
        assert_eq!(KanbanCard::delete(&pool, card.id).await.unwrap(), 1);
        assert_eq!(KanbanCard::delete(&pool, card.id).await.unwrap(), 0);
    }
}
