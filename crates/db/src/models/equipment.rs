use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Machine,
    Tool,
    Fixture,
    Consumable,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EquipmentLocation {
    Shop,
    Field,
    Storage,
    Offsite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Operational,
    NeedsMaintenance,
    OutOfService,
    Retired,
}

/// A piece of shop equipment in the inventory.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    #[ts(optional)]
    pub description: Option<String>,
    pub category: EquipmentCategory,
    pub location: EquipmentLocation,
    pub status: EquipmentStatus,
    #[ts(optional)]
    pub documentation_url: Option<String>,
    /// URLs of stored images, owned by this row (deleted on cascade)
    #[ts(type = "Array<string>")]
    pub images: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new equipment item
#[derive(Debug, Deserialize, TS)]
pub struct CreateEquipment {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: EquipmentCategory,
    #[serde(default = "default_location")]
    pub location: EquipmentLocation,
    #[serde(default = "default_status")]
    pub status: EquipmentStatus,
    pub documentation_url: Option<String>,
}

fn default_category() -> EquipmentCategory {
    EquipmentCategory::Other
}

fn default_location() -> EquipmentLocation {
    EquipmentLocation::Shop
}

fn default_status() -> EquipmentStatus {
    EquipmentStatus::Operational
}

/// Request to update an equipment item. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<EquipmentCategory>,
    pub location: Option<EquipmentLocation>,
    pub status: Option<EquipmentStatus>,
    pub documentation_url: Option<String>,
}

const EQUIPMENT_COLUMNS: &str = "id, name, description, category, location, status, \
     documentation_url, images, created_at, updated_at";

impl Equipment {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateEquipment) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO equipment (id, name, description, category, location, status, \
             documentation_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {EQUIPMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category)
        .bind(data.location)
        .bind(data.status)
        .bind(&data.documentation_url)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateEquipment,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = data.name.as_ref().unwrap_or(&existing.name);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let category = data.category.unwrap_or(existing.category);
        let location = data.location.unwrap_or(existing.location);
        let status = data.status.unwrap_or(existing.status);
        let documentation_url = data
            .documentation_url
            .as_ref()
            .or(existing.documentation_url.as_ref());

        sqlx::query_as::<_, Self>(&format!(
            "UPDATE equipment
             SET name = $2, description = $3, category = $4, location = $5, status = $6,
                 documentation_url = $7, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {EQUIPMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(location)
        .bind(status)
        .bind(documentation_url)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Append a stored image URL to the image list.
    pub async fn append_image(pool: &SqlitePool, id: Uuid, url: &str) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut images = existing.images.0;
        images.push(url.to_string());
        Self::set_images(pool, id, images).await
    }

    /// Remove an image URL from the list. Returns the updated row and
    /// whether the URL was present.
    pub async fn remove_image(
        pool: &SqlitePool,
        id: Uuid,
        url: &str,
    ) -> Result<(Self, bool), sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut images = existing.images.0;
        let before = images.len();
        images.retain(|stored| stored != url);
        let removed = images.len() != before;
        let updated = Self::set_images(pool, id, images).await?;
        Ok((updated, removed))
    }

    async fn set_images(
        pool: &SqlitePool,
        id: Uuid,
        images: Vec<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE equipment
             SET images = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {EQUIPMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(images))
        .fetch_one(pool)
        .await
    }

    /// Set processes for an equipment item (replaces existing associations)
    pub async fn set_processes(
        pool: &SqlitePool,
        equipment_id: Uuid,
        process_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM equipment_processes WHERE equipment_id = $1")
            .bind(equipment_id)
            .execute(pool)
            .await?;

        for process_id in process_ids {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO equipment_processes (id, equipment_id, process_id) \
                 VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(equipment_id)
            .bind(process_id)
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}
