use std::sync::{Arc, Mutex, PoisonError};

use hub_core::merge::{BookmarkEdit, ProgressPatch, merge};
use hub_core::model::{
    CurriculumDocument, DisciplineId, ProgressRecord, QuizScore, RegionName, Resource, StageId,
    UserId,
};
use storage::ProgressStore;
use tokio::sync::{Mutex as QueueLock, watch};
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// Owned record cache: the last server-confirmed document plus what is shown.
struct SyncState {
    confirmed: Mutex<ProgressRecord>,
    display: watch::Sender<ProgressRecord>,
}

impl SyncState {
    fn confirmed(&self) -> ProgressRecord {
        self.confirmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn show(&self, record: ProgressRecord) {
        self.display.send_replace(record);
    }

    fn confirm(&self, record: ProgressRecord) {
        *self.confirmed.lock().unwrap_or_else(PoisonError::into_inner) = record.clone();
        self.display.send_replace(record);
    }

    fn revert(&self) {
        self.display.send_replace(self.confirmed());
    }
}

/// Client-facing entry point for progress mutations on one (user, discipline).
///
/// Each mutation is applied optimistically to the display state (observable
/// through [`subscribe`](Self::subscribe)), written through
/// [`ProgressStore::compare_and_write`] with a fresh server read and merge, and
/// then reconciled: the display state is replaced by the server result on
/// success, or reverted to the last confirmed record on failure. Nothing is
/// retried automatically.
///
/// Mutations from one synchronizer run one at a time in call order. The store
/// round trip runs on its own task, so dropping a pending call does not cancel
/// the write; the result is still reconciled when it lands.
pub struct ProgressSynchronizer {
    user: UserId,
    discipline: DisciplineId,
    store: ProgressStore,
    curriculum: Arc<CurriculumDocument>,
    state: Arc<SyncState>,
    queue: Arc<QueueLock<()>>,
}

impl ProgressSynchronizer {
    /// Load the learner's record and start tracking it.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotAuthenticated` without an identity, or
    /// `SyncError::StoreUnavailable` if the initial read fails.
    pub async fn open(
        identity: Option<UserId>,
        discipline: DisciplineId,
        store: ProgressStore,
        curriculum: Arc<CurriculumDocument>,
    ) -> Result<Self, SyncError> {
        let user = identity.ok_or(SyncError::NotAuthenticated)?;
        let record = store.get(&user, &discipline).await?;
        info!(
            %user,
            %discipline,
            regions = record.regions.len(),
            bookmarks = record.bookmarks.len(),
            "progress hub opened"
        );

        let (display, _) = watch::channel(record.clone());
        Ok(Self {
            user,
            discipline,
            store,
            curriculum,
            state: Arc::new(SyncState {
                confirmed: Mutex::new(record),
                display,
            }),
            queue: Arc::new(QueueLock::new(())),
        })
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn discipline(&self) -> &DisciplineId {
        &self.discipline
    }

    #[must_use]
    pub fn curriculum(&self) -> &CurriculumDocument {
        &self.curriculum
    }

    /// What the UI should render right now, optimistic changes included.
    #[must_use]
    pub fn snapshot(&self) -> ProgressRecord {
        self.state.display.borrow().clone()
    }

    /// The last document the store confirmed.
    #[must_use]
    pub fn confirmed(&self) -> ProgressRecord {
        self.state.confirmed()
    }

    /// Receiver that sees every optimistic update, confirmation and rollback.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressRecord> {
        self.state.display.subscribe()
    }

    /// Flip one checklist task in `region`, writing an explicit `true`/`false`.
    ///
    /// A task that was never recorded becomes `true`; toggling it again leaves
    /// an explicit `false`, not an absent entry.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` if the region is not offered or the task is not in the
    /// curriculum for that stage and region; `StoreUnavailable` if the write
    /// fails.
    pub async fn toggle_checklist_item(
        &self,
        region: &RegionName,
        stage: &StageId,
        task: &str,
    ) -> Result<ProgressRecord, SyncError> {
        self.submit("toggle_checklist_item", |confirmed| {
            self.require_region(region)?;
            if !self.curriculum.has_task(stage, region, task) {
                return Err(SyncError::invalid(format!(
                    "task {task:?} is not part of stage {stage} in region {region}"
                )));
            }
            let done = !confirmed.task(region, stage, task).unwrap_or(false);
            Ok(ProgressPatch::checklist_item(
                region.clone(),
                stage.clone(),
                task.into(),
                done,
            ))
        })
        .await
    }

    /// Replace the reflection notes for one stage in `region`.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` for unknown stages or regions the curriculum does not
    /// offer; `StoreUnavailable` if the write fails.
    pub async fn set_reflection(
        &self,
        region: &RegionName,
        stage: &StageId,
        text: &str,
    ) -> Result<ProgressRecord, SyncError> {
        self.submit("set_reflection", |_| {
            self.require_region(region)?;
            self.require_stage(stage)?;
            Ok(ProgressPatch::notes(region.clone(), stage.clone(), text))
        })
        .await
    }

    /// Record a quiz percentage for a stage.
    ///
    /// Quiz results are curriculum-wide, so they are stored under the default
    /// region regardless of which region the learner is viewing.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` for unknown stages or scores above 100;
    /// `StoreUnavailable` if the write fails.
    pub async fn record_quiz_score(
        &self,
        stage: &StageId,
        score: u32,
    ) -> Result<ProgressRecord, SyncError> {
        self.submit("record_quiz_score", |_| {
            self.require_stage(stage)?;
            let score = QuizScore::new(score).map_err(hub_core::Error::from)?;
            Ok(ProgressPatch::quiz_score(
                RegionName::global(),
                stage.clone(),
                score,
            ))
        })
        .await
    }

    /// Grade an attempt at the stage's quiz and record the resulting score.
    ///
    /// The quiz is taken from the learner's preferred region, with the usual
    /// region fallback.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` if the stage has no quiz; `StoreUnavailable` if the write fails.
    pub async fn submit_quiz(
        &self,
        stage: &StageId,
        answers: &[usize],
    ) -> Result<ProgressRecord, SyncError> {
        self.submit("submit_quiz", |confirmed| {
            let quiz = self
                .require_stage(stage)?
                .content(&confirmed.preferred_region)
                .and_then(|content| content.quiz.as_ref())
                .ok_or_else(|| SyncError::invalid(format!("stage {stage} has no quiz")))?;
            Ok(ProgressPatch::quiz_score(
                RegionName::global(),
                stage.clone(),
                quiz.grade(answers),
            ))
        })
        .await
    }

    /// Add the resource to bookmarks, or remove the bookmark with the same link.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` for a resource without a link; `StoreUnavailable` if the
    /// write fails.
    pub async fn toggle_bookmark(&self, resource: Resource) -> Result<ProgressRecord, SyncError> {
        self.submit("toggle_bookmark", move |confirmed| {
            if resource.link.trim().is_empty() {
                return Err(SyncError::invalid("bookmark link cannot be empty"));
            }
            let edit = if confirmed.bookmarks.contains(&resource.link) {
                BookmarkEdit::Exclude(resource.link)
            } else {
                BookmarkEdit::Include(resource)
            };
            Ok(ProgressPatch::bookmark(edit))
        })
        .await
    }

    /// Remember which region the learner last viewed.
    ///
    /// # Errors
    ///
    /// `InvalidPatch` if the curriculum does not offer the region;
    /// `StoreUnavailable` if the write fails.
    pub async fn set_preferred_region(
        &self,
        region: &RegionName,
    ) -> Result<ProgressRecord, SyncError> {
        self.submit("set_preferred_region", |_| {
            self.require_region(region)?;
            Ok(ProgressPatch::preferred_region(region.clone()))
        })
        .await
    }

    /// Regions other than the default must appear somewhere in the curriculum;
    /// anything else would leave a permanent key in `regions`.
    fn require_region(&self, region: &RegionName) -> Result<(), SyncError> {
        if region.as_str().trim().is_empty() {
            return Err(SyncError::invalid("region name cannot be empty"));
        }
        if !region.is_global() && !self.curriculum.offers_region(region) {
            return Err(SyncError::invalid(format!(
                "region {region} is not offered by this curriculum"
            )));
        }
        Ok(())
    }

    fn require_stage(&self, stage: &StageId) -> Result<&hub_core::model::Stage, SyncError> {
        self.curriculum
            .stage(stage)
            .ok_or_else(|| SyncError::invalid(format!("unknown stage {stage}")))
    }

    async fn submit<F>(&self, kind: &'static str, build: F) -> Result<ProgressRecord, SyncError>
    where
        F: FnOnce(&ProgressRecord) -> Result<ProgressPatch, SyncError>,
    {
        let slot = Arc::clone(&self.queue).lock_owned().await;

        let confirmed = self.state.confirmed();
        let patch = match build(&confirmed) {
            Ok(patch) => patch,
            Err(err) => {
                warn!(kind, error = %err, "dropping progress change");
                return Err(err);
            }
        };
        self.state.show(merge(&confirmed, &patch));

        let store = self.store.clone();
        let user = self.user.clone();
        let discipline = self.discipline.clone();
        let state = Arc::clone(&self.state);
        let round_trip = tokio::spawn(async move {
            let _slot = slot;
            let outcome = store
                .compare_and_write(&user, &discipline, |server| merge(&server, &patch))
                .await;
            match &outcome {
                Ok(next) => state.confirm(next.clone()),
                Err(err) => {
                    warn!(kind, %user, %discipline, error = %err, "progress not saved, reverting");
                    state.revert();
                }
            }
            outcome
        });

        match round_trip.await {
            Ok(Ok(next)) => {
                debug!(kind, "progress change committed");
                Ok(next)
            }
            Ok(Err(err)) => Err(SyncError::StoreUnavailable(err)),
            Err(join) => {
                self.state.revert();
                Err(SyncError::Interrupted(join.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use hub_core::model::{Quiz, QuizQuestion, Stage, StageContent, TaskLabel};
    use hub_core::time::fixed_clock;
    use storage::{InMemoryRepository, StoreConfig};

    fn curriculum() -> Arc<CurriculumDocument> {
        let content = StageContent {
            checklist: vec![TaskLabel::new("read intro"), TaskLabel::new("install tools")],
            quiz: Some(Quiz {
                questions: vec![
                    QuizQuestion {
                        prompt: "HTML stands for?".into(),
                        options: vec!["HyperText Markup Language".into(), "Hot Mail".into()],
                        answer: 0,
                    },
                    QuizQuestion {
                        prompt: "CSS is for?".into(),
                        options: vec!["Styling".into(), "Storage".into()],
                        answer: 0,
                    },
                ],
            }),
            ..StageContent::default()
        };
        Arc::new(CurriculumDocument {
            discipline: DisciplineId::new("frontend").unwrap(),
            stages: vec![Stage {
                id: StageId::from(1),
                title: "Basics".into(),
                regions: BTreeMap::from([(RegionName::global(), content)]),
            }],
        })
    }

    async fn open(repo: &InMemoryRepository) -> ProgressSynchronizer {
        let store =
            ProgressStore::new(Arc::new(repo.clone()), fixed_clock(), StoreConfig::default());
        ProgressSynchronizer::open(
            Some(UserId::new("learner").unwrap()),
            DisciplineId::new("frontend").unwrap(),
            store,
            curriculum(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn open_requires_identity() {
        let store = ProgressStore::new(
            Arc::new(InMemoryRepository::new()),
            fixed_clock(),
            StoreConfig::default(),
        );
        let err = ProgressSynchronizer::open(
            None,
            DisciplineId::new("frontend").unwrap(),
            store,
            curriculum(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, SyncError::NotAuthenticated));
    }

    #[tokio::test]
    async fn unknown_task_is_rejected_without_writing() {
        let repo = InMemoryRepository::new();
        let sync = open(&repo).await;

        let err = sync
            .toggle_checklist_item(&RegionName::global(), &StageId::from(1), "not a task")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidPatch(_)));
        assert!(!err.is_retryable());
        assert!(repo.is_empty());
        assert_eq!(sync.snapshot(), ProgressRecord::default());
    }

    #[tokio::test]
    async fn quiz_attempt_is_graded_and_stored_globally() {
        let repo = InMemoryRepository::new();
        let sync = open(&repo).await;

        let record = sync.submit_quiz(&StageId::from(1), &[0, 1]).await.unwrap();

        assert_eq!(record.quiz_score(&StageId::from(1)), Some(QuizScore::new(50).unwrap()));
        assert_eq!(sync.confirmed(), record);
    }

    #[tokio::test]
    async fn out_of_range_score_is_invalid() {
        let repo = InMemoryRepository::new();
        let sync = open(&repo).await;

        let err = sync.record_quiz_score(&StageId::from(1), 150).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn region_must_be_offered() {
        let repo = InMemoryRepository::new();
        let sync = open(&repo).await;

        assert!(sync.set_preferred_region(&RegionName::new("Mars")).await.is_err());
        let record = sync.set_preferred_region(&RegionName::global()).await.unwrap();
        assert_eq!(record.preferred_region, RegionName::global());
    }

    #[tokio::test]
    async fn blank_or_unoffered_regions_are_rejected_for_every_mutation() {
        let repo = InMemoryRepository::new();
        let sync = open(&repo).await;
        let stage = StageId::from(1);

        for region in [RegionName::new(""), RegionName::new("  "), RegionName::new("Mars")] {
            let toggle = sync
                .toggle_checklist_item(&region, &stage, "read intro")
                .await
                .unwrap_err();
            assert!(matches!(toggle, SyncError::InvalidPatch(_)), "{region:?}");

            let notes = sync.set_reflection(&region, &stage, "draft").await.unwrap_err();
            assert!(matches!(notes, SyncError::InvalidPatch(_)), "{region:?}");

            let preferred = sync.set_preferred_region(&region).await.unwrap_err();
            assert!(matches!(preferred, SyncError::InvalidPatch(_)), "{region:?}");
        }

        assert!(repo.is_empty());
        assert!(sync.snapshot().regions.is_empty());
    }
}
