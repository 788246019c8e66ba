use crate::model::content::ContentError;
use crate::model::ids::LessonId;

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// `position` is only used to label validation errors.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the prompt is blank, there are fewer than two
    /// options, an option is blank, or `correct_index` is out of range.
    pub fn new(
        position: usize,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, ContentError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(ContentError::EmptyPrompt { question: position });
        }
        if options.len() < 2 {
            return Err(ContentError::TooFewOptions {
                question: position,
                count: options.len(),
            });
        }
        if let Some(option) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(ContentError::EmptyOption {
                question: position,
                option,
            });
        }
        if correct_index >= options.len() {
            return Err(ContentError::CorrectIndexOutOfRange {
                question: position,
                index: correct_index,
                options: options.len(),
            });
        }

        Ok(Self {
            prompt,
            options,
            correct_index,
            explanation: explanation
                .map(|e| e.trim().to_owned())
                .filter(|e| !e.is_empty()),
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

/// Ordered questions for a lesson's `PRACTICE` step.
///
/// An empty set is allowed and counts as fully answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSet {
    lesson_id: LessonId,
    questions: Vec<Question>,
}

impl PracticeSet {
    #[must_use]
    pub fn new(lesson_id: LessonId, questions: Vec<Question>) -> Self {
        Self {
            lesson_id,
            questions,
        }
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
