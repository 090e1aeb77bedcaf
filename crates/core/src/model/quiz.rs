use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Percentage score of a quiz attempt, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QuizScore(u8);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizScoreError {
    #[error("quiz score {0} is outside 0..=100")]
    OutOfRange(u32),
}

impl QuizScore {
    pub const MAX: u8 = 100;

    /// Validate a raw percentage.
    ///
    /// # Errors
    ///
    /// Returns `QuizScoreError::OutOfRange` for values above 100.
    pub fn new(percent: u32) -> Result<Self, QuizScoreError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= Self::MAX)
            .map(Self)
            .ok_or(QuizScoreError::OutOfRange(percent))
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for QuizScore {
    type Error = QuizScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(u32::from(value))
    }
}

impl From<QuizScore> for u8 {
    fn from(score: QuizScore) -> Self {
        score.0
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub answer: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Grade an attempt given one selected option index per question.
    ///
    /// Missing answers count as wrong; extra answers are ignored. A quiz with no
    /// questions grades as 0.
    #[must_use]
    pub fn grade(&self, answers: &[usize]) -> QuizScore {
        let total = self.questions.len();
        if total == 0 {
            return QuizScore(0);
        }
        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| q.answer == **a)
            .count();
        QuizScore(rounded_percent(correct, total))
    }
}

/// `round(100 * part / total)` in integer arithmetic; `total` must be non-zero.
pub(crate) fn rounded_percent(part: usize, total: usize) -> u8 {
    let part = part.min(total);
    let pct = (200 * part + total) / (2 * total);
    u8::try_from(pct).unwrap_or(QuizScore::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: usize) -> QuizQuestion {
        QuizQuestion {
            prompt: "?".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            answer,
        }
    }

    #[test]
    fn rejects_scores_above_one_hundred() {
        assert!(QuizScore::new(100).is_ok());
        assert_eq!(QuizScore::new(101), Err(QuizScoreError::OutOfRange(101)));
        assert!(serde_json::from_str::<QuizScore>("140").is_err());
    }

    #[test]
    fn grades_partial_attempts() {
        let quiz = Quiz {
            questions: vec![question(0), question(1), question(2)],
        };
        assert_eq!(quiz.grade(&[0, 1, 2]).percent(), 100);
        assert_eq!(quiz.grade(&[0, 2]).percent(), 33);
        assert_eq!(quiz.grade(&[0, 1]).percent(), 67);
        assert_eq!(quiz.grade(&[]).percent(), 0);
    }

    #[test]
    fn empty_quiz_grades_zero() {
        assert_eq!(Quiz::default().grade(&[1, 2]).percent(), 0);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rounded_percent(4, 5), 80);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(0, 3), 0);
    }
}
