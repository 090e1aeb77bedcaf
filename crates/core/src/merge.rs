//! Region-scoped merge of a local intent into the current server document.
//!
//! Every write goes through [`merge`] against a freshly read server document:
//! the server copy is the base, and the patch replaces only what it names.
//! Regions and stages the patch does not mention are carried over untouched,
//! so a patch computed from a stale snapshot can never drop progress made
//! elsewhere. Concurrent edits of the *same* checklist key, notes field, quiz
//! score, bookmark link or region preference resolve as last write wins.

use std::collections::BTreeMap;

use crate::model::{
    BookmarkSet, ProgressRecord, QuizScore, RegionName, RegionProgress, Resource, StageId,
    StageProgress, TaskLabel,
};

/// Field-level changes to one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagePatch {
    /// Keys to overwrite; explicit `false` is written, not dropped.
    pub checklist: BTreeMap<TaskLabel, bool>,
    pub notes: Option<String>,
    pub quiz_score: Option<QuizScore>,
}

impl StagePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checklist.is_empty() && self.notes.is_none() && self.quiz_score.is_none()
    }

    fn apply_to(&self, stage: &mut StageProgress) {
        for (task, done) in &self.checklist {
            stage.checklist.insert(task.clone(), *done);
        }
        if let Some(notes) = &self.notes {
            stage.notes.clone_from(notes);
        }
        if let Some(score) = self.quiz_score {
            stage.quiz_score = Some(score);
        }
    }
}

/// Changes scoped to exactly one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPatch {
    pub region: RegionName,
    pub stages: BTreeMap<StageId, StagePatch>,
}

/// Change to the bookmark list.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkEdit {
    /// Swap the whole list.
    Replace(BookmarkSet),
    /// Ensure a bookmark with this link exists (server metadata wins if it does).
    Include(Resource),
    /// Ensure no bookmark with this link exists.
    Exclude(String),
}

impl BookmarkEdit {
    fn apply_to(&self, bookmarks: &mut BookmarkSet) {
        match self {
            BookmarkEdit::Replace(set) => bookmarks.clone_from(set),
            BookmarkEdit::Include(resource) => {
                bookmarks.insert(resource.clone());
            }
            BookmarkEdit::Exclude(link) => {
                bookmarks.remove(link);
            }
        }
    }
}

/// A caller's local intent. Touches at most one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressPatch {
    pub preferred_region: Option<RegionName>,
    pub bookmarks: Option<BookmarkEdit>,
    pub region: Option<RegionPatch>,
}

impl ProgressPatch {
    fn single_stage(region: RegionName, stage: StageId, patch: StagePatch) -> Self {
        Self {
            region: Some(RegionPatch {
                region,
                stages: BTreeMap::from([(stage, patch)]),
            }),
            ..Self::default()
        }
    }

    /// Set one checklist key to an explicit value.
    #[must_use]
    pub fn checklist_item(
        region: RegionName,
        stage: StageId,
        task: TaskLabel,
        done: bool,
    ) -> Self {
        Self::single_stage(
            region,
            stage,
            StagePatch {
                checklist: BTreeMap::from([(task, done)]),
                ..StagePatch::default()
            },
        )
    }

    #[must_use]
    pub fn notes(region: RegionName, stage: StageId, text: impl Into<String>) -> Self {
        Self::single_stage(
            region,
            stage,
            StagePatch {
                notes: Some(text.into()),
                ..StagePatch::default()
            },
        )
    }

    #[must_use]
    pub fn quiz_score(region: RegionName, stage: StageId, score: QuizScore) -> Self {
        Self::single_stage(
            region,
            stage,
            StagePatch {
                quiz_score: Some(score),
                ..StagePatch::default()
            },
        )
    }

    #[must_use]
    pub fn bookmark(edit: BookmarkEdit) -> Self {
        Self {
            bookmarks: Some(edit),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn preferred_region(region: RegionName) -> Self {
        Self {
            preferred_region: Some(region),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preferred_region.is_none()
            && self.bookmarks.is_none()
            && self
                .region
                .as_ref()
                .is_none_or(|r| r.stages.values().all(StagePatch::is_empty))
    }
}

/// Compute the next document from the current server document and a patch.
#[must_use]
pub fn merge(server: &ProgressRecord, patch: &ProgressPatch) -> ProgressRecord {
    let mut next = server.clone();

    if let Some(region_patch) = &patch.region {
        let stages_touched = region_patch.stages.values().any(|p| !p.is_empty());
        if stages_touched {
            let region = next
                .regions
                .entry(region_patch.region.clone())
                .or_insert_with(RegionProgress::default);
            for (stage_id, stage_patch) in &region_patch.stages {
                if stage_patch.is_empty() {
                    continue;
                }
                let stage = region.stages.entry(stage_id.clone()).or_default();
                stage_patch.apply_to(stage);
            }
        }
    }

    if let Some(region) = &patch.preferred_region {
        next.preferred_region.clone_from(region);
    }

    if let Some(edit) = &patch.bookmarks {
        edit.apply_to(&mut next.bookmarks);
    }

    next
}
