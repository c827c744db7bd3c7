use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

/// One column of the kanban board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct BoardColumn {
    /// Opaque, externally visible column id (referenced by `cards.column_id`)
    pub id: String,
    pub title: String,
    pub position: i64,
}

/// The whole-document board layout, persisted as one row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct BoardConfig {
    pub id: Uuid,
    #[ts(type = "Array<BoardColumn>")]
    pub columns: Json<Vec<BoardColumn>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnConfigError {
    #[error("column ids must be unique and non-empty")]
    InvalidIds,
    #[error("column titles must not be empty")]
    EmptyTitle,
    #[error("column positions must be unique and dense starting at 0")]
    InvalidPositions,
}

/// Check the board-config invariant: ids unique and non-empty, titles
/// non-empty, positions unique and dense (0..n-1).
pub fn validate_columns(columns: &[BoardColumn]) -> Result<(), ColumnConfigError> {
    let mut ids = std::collections::HashSet::new();
    for column in columns {
        if column.id.trim().is_empty() || !ids.insert(column.id.as_str()) {
            return Err(ColumnConfigError::InvalidIds);
        }
        if column.title.trim().is_empty() {
            return Err(ColumnConfigError::EmptyTitle);
        }
    }

    let mut positions: Vec<i64> = columns.iter().map(|c| c.position).collect();
    positions.sort_unstable();
    for (expected, position) in positions.into_iter().enumerate() {
        if position != expected as i64 {
            return Err(ColumnConfigError::InvalidPositions);
        }
    }

    Ok(())
}

fn default_columns() -> Vec<BoardColumn> {
    ["Queue", "Machining", "Inspection", "Done"]
        .into_iter()
        .enumerate()
        .map(|(position, title)| BoardColumn {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            position: position as i64,
        })
        .collect()
}

/// Fixed id of the single `board_configs` row. Anchoring writes to one
/// primary key keeps the table at one row even under concurrent first
/// reads.
const SINGLETON_ID: Uuid = Uuid::nil();

impl BoardConfig {
    /// Fetch the board config, creating the default layout on first access.
    pub async fn get_or_init(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let existing = sqlx::query_as::<_, Self>(
            "SELECT id, columns, created_at, updated_at FROM board_configs WHERE id = $1",
        )
        .bind(SINGLETON_ID)
        .fetch_optional(pool)
        .await?;

        if let Some(config) = existing {
            return Ok(config);
        }

        // A concurrent initializer may have won; DO NOTHING and re-read.
        sqlx::query(
            "INSERT INTO board_configs (id, columns) VALUES ($1, $2)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(SINGLETON_ID)
        .bind(Json(default_columns()))
        .execute(pool)
        .await?;

        sqlx::query_as::<_, Self>(
            "SELECT id, columns, created_at, updated_at FROM board_configs WHERE id = $1",
        )
        .bind(SINGLETON_ID)
        .fetch_one(pool)
        .await
    }

    /// Replace the whole column document. Callers must have validated the
    /// columns with [`validate_columns`] first.
    pub async fn replace(pool: &SqlitePool, columns: Vec<BoardColumn>) -> Result<Self, sqlx::Error> {
        Self::get_or_init(pool).await?;
        sqlx::query_as::<_, Self>(
            "UPDATE board_configs
             SET columns = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING id, columns, created_at, updated_at",
        )
        .bind(SINGLETON_ID)
        .bind(Json(columns))
        .fetch_one(pool)
        .await
    }

    /// Whether a card's column reference points at an existing column.
    pub fn has_column(&self, column_id: &str) -> bool {
        self.columns.0.iter().any(|c| c.id == column_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;

    fn column(id: &str, title: &str, position: i64) -> BoardColumn {
        BoardColumn {
            id: id.to_string(),
            title: title.to_string(),
            position,
        }
    }

    #[test]
    fn validate_accepts_dense_unique_positions() {
        let columns = vec![
            column("a", "Queue", 0),
            column("b", "Machining", 1),
            column("c", "Done", 2),
        ];
        assert!(validate_columns(&columns).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_positions() {
        let columns = vec![column("a", "Queue", 0), column("b", "Machining", 0)];
        assert_eq!(
            validate_columns(&columns),
            Err(ColumnConfigError::InvalidPositions)
        );
    }

    #[test]
    fn validate_rejects_gaps() {
        let columns = vec![column("a", "Queue", 0), column("b", "Machining", 2)];
        assert_eq!(
            validate_columns(&columns),
            Err(ColumnConfigError::InvalidPositions)
        );
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let columns = vec![column("a", "Queue", 0), column("a", "Machining", 1)];
        assert_eq!(validate_columns(&columns), Err(ColumnConfigError::InvalidIds));
    }

    #[test]
    fn validate_accepts_empty_board() {
        assert!(validate_columns(&[]).is_ok());
    }

    #[tokio::test]
    async fn get_or_init_creates_default_layout_once() {
        let (pool, _dir) = create_test_pool().await;

        let first = BoardConfig::get_or_init(&pool).await.unwrap();
        assert_eq!(first.columns.0.len(), 4);
        assert!(validate_columns(&first.columns.0).is_ok());

        let second = BoardConfig::get_or_init(&pool).await.unwrap();
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn concurrent_first_reads_converge_on_one_row() {
        let (pool, _dir) = create_test_pool().await;

        let (first, second) = tokio::join!(
            BoardConfig::get_or_init(&pool),
            BoardConfig::get_or_init(&pool)
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first.id, second.id);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM board_configs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn replace_overwrites_whole_document() {
        let (pool, _dir) = create_test_pool().await;

        let columns = vec![column("cut", "Cut List", 0), column("done", "Done", 1)];
        let updated = BoardConfig::replace(&pool, columns.clone()).await.unwrap();
        assert_eq!(updated.columns.0, columns);
        assert!(updated.has_column("cut"));
        assert!(!updated.has_column("queue"));
    }
}
