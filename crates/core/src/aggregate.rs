//! Completion percentages derived from a progress record and its curriculum.
//!
//! The curriculum is the schema: only labels listed in the resolved checklist
//! count, so labels left over from an older curriculum are silently ignored.

use crate::model::{CurriculumDocument, ProgressRecord, RegionName, Stage, StageId, rounded_percent};

/// `(checked, total)` for one stage in one region.
fn stage_counts(stage: &Stage, record: &ProgressRecord, region: &RegionName) -> (usize, usize) {
    let Some(content) = stage.content(region) else {
        return (0, 0);
    };
    let total = content.checklist.len();
    let checked = record.stage(region, &stage.id).map_or(0, |progress| {
        content
            .checklist
            .iter()
            .filter(|task| progress.is_done(task.as_str()))
            .count()
    });
    (checked, total)
}

fn percent(checked: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        rounded_percent(checked, total)
    }
}

/// Share of checklist items completed in `region`, across all stages.
#[must_use]
pub fn completion_percent(
    curriculum: &CurriculumDocument,
    record: &ProgressRecord,
    region: &RegionName,
) -> u8 {
    let (checked, total) = curriculum
        .stages
        .iter()
        .map(|stage| stage_counts(stage, record, region))
        .fold((0, 0), |(c, t), (sc, st)| (c + sc, t + st));
    percent(checked, total)
}

/// Share of one stage's checklist completed in `region`; `0` for unknown stages.
#[must_use]
pub fn stage_percent(
    curriculum: &CurriculumDocument,
    record: &ProgressRecord,
    region: &RegionName,
    stage: &StageId,
) -> u8 {
    curriculum.stage(stage).map_or(0, |stage| {
        let (checked, total) = stage_counts(stage, record, region);
        percent(checked, total)
    })
}

/// Completion in the learner's preferred region.
#[must_use]
pub fn overall_percent(curriculum: &CurriculumDocument, record: &ProgressRecord) -> u8 {
    completion_percent(curriculum, record, &record.preferred_region)
}
