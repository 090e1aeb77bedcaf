use hub_core::aggregate::{completion_percent, stage_percent};
use hub_core::model::{
    CurriculumDocument, ProgressRecord, QuizScore, RegionName, Resource, StageId, TaskLabel,
};

/// Display state of a checklist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Done,
    /// Explicitly un-checked after having been recorded.
    NotDone,
    Unrecorded,
}

impl TaskState {
    fn from_recorded(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Done,
            Some(false) => Self::NotDone,
            None => Self::Unrecorded,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub label: TaskLabel,
    pub state: TaskState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceView {
    pub resource: Resource,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageView {
    pub id: StageId,
    pub title: String,
    pub overview: String,
    pub tasks: Vec<TaskView>,
    pub resources: Vec<ResourceView>,
    pub notes: String,
    pub has_quiz: bool,
    pub quiz_score: Option<QuizScore>,
    pub percent: u8,
}

/// Read-only projection of one hub page for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct HubView {
    pub region: RegionName,
    pub stages: Vec<StageView>,
    pub percent: u8,
    pub bookmarks: Vec<Resource>,
}

impl HubView {
    #[must_use]
    pub fn build(
        curriculum: &CurriculumDocument,
        record: &ProgressRecord,
        region: &RegionName,
    ) -> Self {
        let stages = curriculum
            .stages
            .iter()
            .filter_map(|stage| {
                let content = stage.content(region)?;
                let tasks = content
                    .checklist
                    .iter()
                    .map(|label| TaskView {
                        label: label.clone(),
                        state: TaskState::from_recorded(
                            record.task(region, &stage.id, label.as_str()),
                        ),
                    })
                    .collect();
                let resources = content
                    .resources
                    .iter()
                    .map(|resource| ResourceView {
                        resource: resource.clone(),
                        bookmarked: record.bookmarks.contains(&resource.link),
                    })
                    .collect();
                Some(StageView {
                    id: stage.id.clone(),
                    title: stage.title.clone(),
                    overview: content.overview.clone(),
                    tasks,
                    resources,
                    notes: record.notes(region, &stage.id).to_owned(),
                    has_quiz: content.quiz.is_some(),
                    quiz_score: record.quiz_score(&stage.id),
                    percent: stage_percent(curriculum, record, region, &stage.id),
                })
            })
            .collect();

        Self {
            region: region.clone(),
            stages,
            percent: completion_percent(curriculum, record, region),
            bookmarks: record.bookmarks.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::merge::{BookmarkEdit, ProgressPatch, merge};

    fn curriculum() -> CurriculumDocument {
        serde_json::from_str(
            r#"{
                "discipline": "frontend",
                "stages": [{
                    "id": "1",
                    "title": "Basics",
                    "regions": {
                        "Global": {
                            "overview": "Start here",
                            "checklist": ["read intro", "install tools", "say hello"],
                            "resources": [
                                {"title": "MDN", "type": "docs", "link": "https://mdn", "platform": "MDN"}
                            ]
                        }
                    }
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn distinguishes_unrecorded_from_unchecked() {
        let global = RegionName::global();
        let mut record = ProgressRecord::default();
        for (task, done) in [("read intro", true), ("install tools", false)] {
            record = merge(
                &record,
                &ProgressPatch::checklist_item(global.clone(), StageId::from(1), task.into(), done),
            );
        }
        record = merge(
            &record,
            &ProgressPatch::bookmark(BookmarkEdit::Include(Resource::new(
                "MDN", "docs", "https://mdn", "MDN",
            ))),
        );

        let view = HubView::build(&curriculum(), &record, &global);
        let states: Vec<_> = view.stages[0].tasks.iter().map(|t| t.state).collect();

        assert_eq!(
            states,
            [TaskState::Done, TaskState::NotDone, TaskState::Unrecorded]
        );
        assert_eq!(view.stages[0].percent, 33);
        assert_eq!(view.percent, 33);
        assert!(view.stages[0].resources[0].bookmarked);
        assert_eq!(view.stages[0].overview, "Start here");
        assert!(!view.stages[0].has_quiz);
    }
}
