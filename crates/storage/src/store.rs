use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hub_core::Clock;
use hub_core::model::{DisciplineId, ProgressRecord, UserId};
use tracing::{debug, warn};

use crate::repository::{ProgressRepository, StorageError};

/// Tunables for [`ProgressStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound for each individual repository call.
    pub timeout: Duration,
}

impl StoreConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// The only component allowed to read-then-write progress documents.
///
/// There is no transaction around the read and the upsert; the backend is
/// only assumed to upsert a single document atomically.
#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
    clock: Clock,
    config: StoreConfig,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>, clock: Clock, config: StoreConfig) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout = ?self.config.timeout, "progress store call timed out");
                Err(StorageError::Timeout(self.config.timeout))
            }
        }
    }

    /// The stored document, or the default one when nothing was ever written.
    ///
    /// Never writes; the default is only persisted by a later mutation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure or timeout.
    pub async fn get(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
    ) -> Result<ProgressRecord, StorageError> {
        let row = self
            .bounded("load", self.repo.load(user, discipline))
            .await?;
        Ok(row.map(|row| row.record).unwrap_or_default())
    }

    /// Read the current document, hand it to `mutator`, and upsert the result.
    ///
    /// Issues exactly one upsert and returns the document that was written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read or the write fails or times out. A
    /// failed read means nothing was written.
    pub async fn compare_and_write<F>(
        &self,
        user: &UserId,
        discipline: &DisciplineId,
        mutator: F,
    ) -> Result<ProgressRecord, StorageError>
    where
        F: FnOnce(ProgressRecord) -> ProgressRecord + Send,
    {
        let current = self.get(user, discipline).await?;
        let next = mutator(current);
        let now = self.clock.now();
        self.bounded("save", self.repo.save(user, discipline, &next, now))
            .await?;
        debug!(%user, %discipline, "progress document written");
        Ok(next)
    }
}
