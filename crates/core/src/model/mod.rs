mod curriculum;
mod ids;
mod progress;
mod quiz;
mod resource;

pub(crate) use quiz::rounded_percent;

pub use curriculum::{CurriculumDocument, Stage, StageContent};
pub use ids::{DEFAULT_REGION, DisciplineId, IdError, RegionName, StageId, TaskLabel, UserId};
pub use progress::{ProgressRecord, RegionProgress, StageProgress};
pub use quiz::{Quiz, QuizQuestion, QuizScore, QuizScoreError};
pub use resource::{BookmarkSet, Resource};
