#![forbid(unsafe_code)]

pub mod app_services;
pub mod curriculum;
pub mod error;
pub mod hub_view;
pub mod synchronizer;

pub use hub_core::Clock;

pub use app_services::HubServices;
pub use curriculum::{CurriculumSource, InMemoryCurriculum, JsonCurriculumDir};
pub use error::{CurriculumError, HubServicesError, SyncError};
pub use hub_view::{HubView, ResourceView, StageView, TaskState, TaskView};
pub use synchronizer::ProgressSynchronizer;
