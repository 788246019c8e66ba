use crate::model::content::{ContentError, MediaRef};
use crate::model::ids::LessonId;

/// One titled block of a reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSection {
    pub heading: Option<String>,
    pub body: String,
}

impl ReadingSection {
    #[must_use]
    pub fn new(heading: Option<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading
                .map(|h| h.trim().to_owned())
                .filter(|h| !h.is_empty()),
            body: body.into(),
        }
    }
}

/// Static instructional text for a lesson's `READING` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingContent {
    lesson_id: LessonId,
    title: String,
    sections: Vec<ReadingSection>,
    media: Option<MediaRef>,
}

impl ReadingContent {
    /// # Errors
    ///
    /// - `EmptyTitle` if the title is blank
    /// - `NoSections` if there are no sections
    /// - `EmptySection` if a section body is blank
    pub fn new(
        lesson_id: LessonId,
        title: impl Into<String>,
        sections: Vec<ReadingSection>,
        media: Option<MediaRef>,
    ) -> Result<Self, ContentError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ContentError::EmptyTitle);
        }
        if sections.is_empty() {
            return Err(ContentError::NoSections);
        }
        if let Some(index) = sections.iter().position(|s| s.body.trim().is_empty()) {
            return Err(ContentError::EmptySection { index });
        }

        Ok(Self {
            lesson_id,
            title,
            sections,
            media,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[ReadingSection] {
        &self.sections
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }
}
