use thiserror::Error;

use crate::model::{IdError, QuizScoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    QuizScore(#[from] QuizScoreError),
}
