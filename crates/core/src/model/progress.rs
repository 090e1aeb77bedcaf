use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{RegionName, StageId, TaskLabel};
use crate::model::quiz::QuizScore;
use crate::model::resource::BookmarkSet;

/// Progress within one stage of one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    /// `true` = done, explicit `false` = un-checked, missing = never recorded.
    #[serde(default)]
    pub checklist: BTreeMap<TaskLabel, bool>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub quiz_score: Option<QuizScore>,
}

impl StageProgress {
    /// Recorded state for `task`, or `None` when it was never touched.
    #[must_use]
    pub fn task(&self, task: &str) -> Option<bool> {
        self.checklist.get(task).copied()
    }

    #[must_use]
    pub fn is_done(&self, task: &str) -> bool {
        self.task(task).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionProgress {
    #[serde(default)]
    pub stages: BTreeMap<StageId, StageProgress>,
}

impl RegionProgress {
    #[must_use]
    pub fn stage(&self, stage: &StageId) -> Option<&StageProgress> {
        self.stages.get(stage)
    }
}

/// Canonical progress document for one (user, discipline) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub preferred_region: RegionName,
    #[serde(default)]
    pub regions: BTreeMap<RegionName, RegionProgress>,
    #[serde(default)]
    pub bookmarks: BookmarkSet,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            preferred_region: RegionName::global(),
            regions: BTreeMap::new(),
            bookmarks: BookmarkSet::new(),
        }
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn region(&self, region: &RegionName) -> Option<&RegionProgress> {
        self.regions.get(region)
    }

    #[must_use]
    pub fn stage(&self, region: &RegionName, stage: &StageId) -> Option<&StageProgress> {
        self.region(region).and_then(|r| r.stage(stage))
    }

    /// Recorded state of a checklist task, `None` if never recorded.
    #[must_use]
    pub fn task(&self, region: &RegionName, stage: &StageId, task: &str) -> Option<bool> {
        self.stage(region, stage).and_then(|s| s.task(task))
    }

    #[must_use]
    pub fn notes(&self, region: &RegionName, stage: &StageId) -> &str {
        self.stage(region, stage).map_or("", |s| s.notes.as_str())
    }

    /// Quiz results are curriculum-wide and live under the default region.
    #[must_use]
    pub fn quiz_score(&self, stage: &StageId) -> Option<QuizScore> {
        self.stage(&RegionName::global(), stage)
            .and_then(|s| s.quiz_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_targets_global_region() {
        let record = ProgressRecord::default();
        assert_eq!(record.preferred_region, RegionName::global());
        assert!(record.regions.is_empty());
        assert!(record.bookmarks.is_empty());
    }

    #[test]
    fn explicit_false_survives_serialization() {
        let mut stage = StageProgress::default();
        stage.checklist.insert(TaskLabel::new("read intro"), false);
        let mut region = RegionProgress::default();
        region.stages.insert(StageId::from(1), stage);
        let mut record = ProgressRecord::default();
        record.regions.insert(RegionName::global(), region);

        let json = serde_json::to_string(&record).unwrap();
        let back: ProgressRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(
            back.task(&RegionName::global(), &StageId::from(1), "read intro"),
            Some(false)
        );
        assert_eq!(
            back.task(&RegionName::global(), &StageId::from(1), "watch video"),
            None
        );
    }

    #[test]
    fn tolerates_sparse_documents() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"regions":{"EU":{"stages":{"2":{"notes":"hi"}}}}}"#)
                .unwrap();
        assert_eq!(record.preferred_region, RegionName::global());
        assert_eq!(
            record.notes(&RegionName::new("EU"), &StageId::from(2)),
            "hi"
        );
        assert_eq!(record.quiz_score(&StageId::from(2)), None);
    }
}
