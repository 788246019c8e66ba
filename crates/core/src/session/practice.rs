use thiserror::Error;

use crate::model::{PracticeSet, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("practice set has no questions")]
    NoQuestions,

    #[error("option {option} does not exist on question {question}")]
    OptionOutOfRange { question: usize, option: usize },

    #[error("question {question} was already answered and left")]
    AnswerFinal { question: usize },

    #[error("already at the first question")]
    AtFirstQuestion,

    #[error("already at the last question")]
    AtLastQuestion,
}

/// Correctness shown right after an answer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { correct_index: usize },
}

impl Feedback {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Feedback::Correct)
    }
}

/// Answers recorded during one pass through a practice set.
///
/// Each question holds at most one answer. Selecting again while the cursor is
/// still on the question replaces the answer; once the learner moves to
/// another question an answered question is final. Moving around never drops
/// recorded answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeState {
    set: PracticeSet,
    answers: Vec<Option<usize>>,
    finalized: Vec<bool>,
    cursor: usize,
}

impl PracticeState {
    #[must_use]
    pub fn new(set: PracticeSet) -> Self {
        let len = set.len();
        Self {
            set,
            answers: vec![None; len],
            finalized: vec![false; len],
            cursor: 0,
        }
    }

    /// Index of the question on screen.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.set.questions().get(self.cursor)
    }

    #[must_use]
    pub fn answer(&self, question: usize) -> Option<usize> {
        self.answers.get(question).copied().flatten()
    }

    #[must_use]
    pub fn feedback(&self, question: usize) -> Option<Feedback> {
        let q = self.set.questions().get(question)?;
        let chosen = self.answer(question)?;
        Some(feedback_for(q, chosen))
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        (0..self.total())
            .filter(|&i| self.feedback(i).is_some_and(|f| f.is_correct()))
            .count()
    }

    /// True once every question has an answer, right or wrong.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    /// Checks whether `option` may be recorded for the current question.
    ///
    /// # Errors
    ///
    /// Same as [`PracticeState::select`].
    pub fn check_select(&self, option: usize) -> Result<(), PracticeError> {
        let question = self
            .current_question()
            .ok_or(PracticeError::NoQuestions)?;
        if self.finalized[self.cursor] {
            return Err(PracticeError::AnswerFinal {
                question: self.cursor,
            });
        }
        if option >= question.options().len() {
            return Err(PracticeError::OptionOutOfRange {
                question: self.cursor,
                option,
            });
        }
        Ok(())
    }

    /// Records `option` for the current question and reveals correctness.
    ///
    /// # Errors
    ///
    /// - `NoQuestions` for an empty set
    /// - `AnswerFinal` if the question was answered and then left
    /// - `OptionOutOfRange` if the option does not exist
    pub fn select(&mut self, option: usize) -> Result<Feedback, PracticeError> {
        self.check_select(option)?;
        self.answers[self.cursor] = Some(option);
        let question = &self.set.questions()[self.cursor];
        Ok(feedback_for(question, option))
    }

    /// # Errors
    ///
    /// Returns `AtLastQuestion` when there is nothing after the cursor.
    pub fn check_next_question(&self) -> Result<(), PracticeError> {
        if self.cursor + 1 >= self.total() {
            return Err(PracticeError::AtLastQuestion);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AtFirstQuestion` when the cursor is at the start.
    pub fn check_previous_question(&self) -> Result<(), PracticeError> {
        if self.cursor == 0 {
            return Err(PracticeError::AtFirstQuestion);
        }
        Ok(())
    }

    /// Moves to the following question.
    ///
    /// # Errors
    ///
    /// Returns `AtLastQuestion` when there is nothing after the cursor.
    pub fn next_question(&mut self) -> Result<usize, PracticeError> {
        self.check_next_question()?;
        self.leave_current();
        self.cursor += 1;
        Ok(self.cursor)
    }

    /// Moves to the preceding question.
    ///
    /// # Errors
    ///
    /// Returns `AtFirstQuestion` when the cursor is at the start.
    pub fn previous_question(&mut self) -> Result<usize, PracticeError> {
        self.check_previous_question()?;
        self.leave_current();
        self.cursor -= 1;
        Ok(self.cursor)
    }

    fn leave_current(&mut self) {
        if self.answers[self.cursor].is_some() {
            self.finalized[self.cursor] = true;
        }
    }
}

fn feedback_for(question: &Question, chosen: usize) -> Feedback {
    if question.is_correct(chosen) {
        Feedback::Correct
    } else {
        Feedback::Incorrect {
            correct_index: question.correct_index(),
        }
    }
}
