use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_core::model::{DisciplineId, ProgressRecord, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
}

/// Persisted progress row: the full document plus its last write time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub record: ProgressRecord,
    pub updated_at: DateTime<Utc>,
}

/// Durable access to progress documents keyed by (user, discipline).
///
/// Implementations only read and upsert whole documents; deciding what the
/// next document looks like is the caller's job.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the stored document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the row is corrupt.
    async fn load(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
    ) -> Result<Option<ProgressRow>, StorageError>;

    /// Insert or fully replace the document for (user, discipline).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    rows: Arc<Mutex<HashMap<(UserId, DisciplineId), ProgressRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().map_or(0, |guard| guard.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
    ) -> Result<Option<ProgressRow>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user.clone(), discipline.clone())).cloned())
    }

    async fn save(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (user.clone(), discipline.clone()),
            ProgressRow {
                record: record.clone(),
                updated_at,
            },
        );
        Ok(())
    }
}

/// Repository handle behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::merge::{ProgressPatch, merge};
    use hub_core::model::{RegionName, StageId};
    use hub_core::time::fixed_now;

    #[tokio::test]
    async fn round_trips_documents_per_key() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u-1").unwrap();
        let frontend = DisciplineId::new("frontend").unwrap();
        let backend = DisciplineId::new("backend").unwrap();

        let record = merge(
            &ProgressRecord::default(),
            &ProgressPatch::notes(RegionName::global(), StageId::from(1), "hello"),
        );
        repo.save(&user, &frontend, &record, fixed_now()).await.unwrap();

        let row = repo.load(&user, &frontend).await.unwrap().unwrap();
        assert_eq!(row.record, record);
        assert_eq!(row.updated_at, fixed_now());
        assert!(repo.load(&user, &backend).await.unwrap().is_none());
        assert_eq!(repo.len(), 1);
    }
}
