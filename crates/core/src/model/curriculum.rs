use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{DisciplineId, RegionName, StageId, TaskLabel};
use crate::model::quiz::Quiz;
use crate::model::resource::Resource;

/// Region-specific content of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageContent {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub checklist: Vec<TaskLabel>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

impl StageContent {
    #[must_use]
    pub fn has_task(&self, task: &str) -> bool {
        self.checklist.iter().any(|t| t.as_str() == task)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    #[serde(default)]
    pub title: String,
    pub regions: BTreeMap<RegionName, StageContent>,
}

impl Stage {
    /// Content for `region`, falling back to the default region and then to
    /// whichever region the stage lists first.
    #[must_use]
    pub fn content(&self, region: &RegionName) -> Option<&StageContent> {
        self.regions
            .get(region)
            .or_else(|| self.regions.get(&RegionName::global()))
            .or_else(|| self.regions.values().next())
    }
}

/// Read-only curriculum for one discipline. Never mutated by the progress engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumDocument {
    pub discipline: DisciplineId,
    pub stages: Vec<Stage>,
}

impl CurriculumDocument {
    #[must_use]
    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.id == id)
    }

    /// Whether `task` is a live checklist label for this stage and region.
    #[must_use]
    pub fn has_task(&self, stage: &StageId, region: &RegionName, task: &str) -> bool {
        self.stage(stage)
            .and_then(|s| s.content(region))
            .is_some_and(|c| c.has_task(task))
    }

    /// Every region named anywhere in the curriculum, in order.
    pub fn regions(&self) -> impl Iterator<Item = &RegionName> {
        let mut seen: Vec<&RegionName> = Vec::new();
        for stage in &self.stages {
            for region in stage.regions.keys() {
                if !seen.contains(&region) {
                    seen.push(region);
                }
            }
        }
        seen.into_iter()
    }

    /// Whether `region` is offered by at least one stage.
    #[must_use]
    pub fn offers_region(&self, region: &RegionName) -> bool {
        self.regions().any(|r| r == region)
    }
}
