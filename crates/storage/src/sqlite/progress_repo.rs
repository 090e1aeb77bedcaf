use chrono::{DateTime, Utc};
use hub_core::model::{DisciplineId, ProgressRecord, UserId};

use super::SqliteRepository;
use super::mapping::{encode_progress, map_progress_row};
use crate::repository::{ProgressRepository, ProgressRow, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
    ) -> Result<Option<ProgressRow>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT preferred_region, regions, bookmarks, updated_at
            FROM progress_records
            WHERE user_id = ?1 AND discipline_id = ?2
            ",
        )
        .bind(user.as_str())
        .bind(discipline.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let encoded = encode_progress(record)?;

        sqlx::query(
            r"
            INSERT INTO progress_records (
                user_id, discipline_id, preferred_region, regions, bookmarks, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, discipline_id) DO UPDATE SET
                preferred_region = excluded.preferred_region,
                regions = excluded.regions,
                bookmarks = excluded.bookmarks,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.as_str())
        .bind(discipline.as_str())
        .bind(encoded.preferred_region)
        .bind(encoded.regions)
        .bind(encoded.bookmarks)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
