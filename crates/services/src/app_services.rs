use std::sync::Arc;

use hub_core::model::{DisciplineId, UserId};
use storage::repository::Storage;
use storage::{ProgressStore, StoreConfig};

use crate::curriculum::CurriculumSource;
use crate::error::{HubServicesError, SyncError};
use crate::synchronizer::ProgressSynchronizer;
use crate::Clock;

/// Assembles the progress store and curriculum source behind one handle.
#[derive(Clone)]
pub struct HubServices {
    store: ProgressStore,
    curricula: Arc<dyn CurriculumSource>,
}

impl HubServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        clock: Clock,
        config: StoreConfig,
        curricula: Arc<dyn CurriculumSource>,
    ) -> Self {
        Self {
            store: ProgressStore::new(Arc::clone(&storage.progress), clock, config),
            curricula,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `HubServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: StoreConfig,
        curricula: Arc<dyn CurriculumSource>,
    ) -> Result<Self, HubServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, config, curricula))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, curricula: Arc<dyn CurriculumSource>) -> Self {
        Self::new(&Storage::in_memory(), clock, StoreConfig::default(), curricula)
    }

    /// Fetch the discipline's curriculum and open a synchronizer for the learner.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without an identity,
    /// `SyncError::Curriculum` if the curriculum cannot be loaded, or
    /// `SyncError::StoreUnavailable` if the learner's record cannot be read.
    pub async fn open_hub(
        &self,
        identity: Option<UserId>,
        discipline: DisciplineId,
    ) -> Result<ProgressSynchronizer, SyncError> {
        let user = identity.ok_or(SyncError::NotAuthenticated)?;
        let curriculum = self.curricula.curriculum(&discipline).await?;
        ProgressSynchronizer::open(
            Some(user),
            discipline,
            self.store.clone(),
            Arc::new(curriculum),
        )
        .await
    }
}
