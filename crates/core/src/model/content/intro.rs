use crate::model::content::{ContentError, MediaRef};
use crate::model::ids::ModuleId;

/// Onboarding shown the first time a learner opens a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIntro {
    module_id: ModuleId,
    title: String,
    context: String,
    media: Option<MediaRef>,
}

impl ModuleIntro {
    /// # Errors
    ///
    /// Returns `EmptyTitle` or `EmptyContext` for blank text.
    pub fn new(
        module_id: ModuleId,
        title: impl Into<String>,
        context: impl Into<String>,
        media: Option<MediaRef>,
    ) -> Result<Self, ContentError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ContentError::EmptyTitle);
        }
        let context = context.into();
        if context.trim().is_empty() {
            return Err(ContentError::EmptyContext);
        }

        Ok(Self {
            module_id,
            title,
            context,
            media,
        })
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }
}
