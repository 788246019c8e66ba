use thiserror::Error;

use crate::model::content::MediaError;

/// Validation failures for lesson content handed over by a content provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content title cannot be empty")]
    EmptyTitle,

    #[error("module intro text cannot be empty")]
    EmptyContext,

    #[error("reading needs at least one section")]
    NoSections,

    #[error("reading section {index} has an empty body")]
    EmptySection { index: usize },

    #[error("question {question} has an empty prompt")]
    EmptyPrompt { question: usize },

    #[error("question {question} needs at least two options, got {count}")]
    TooFewOptions { question: usize, count: usize },

    #[error("question {question} option {option} is empty")]
    EmptyOption { question: usize, option: usize },

    #[error("question {question} marks option {index} correct but only has {options}")]
    CorrectIndexOutOfRange {
        question: usize,
        index: usize,
        options: usize,
    },

    #[error(transparent)]
    Media(#[from] MediaError),
}
