use thiserror::Error;

use crate::model::{CatalogIntegrityError, ContentError, MediaError};
use crate::session::InvalidTransition;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogIntegrityError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}
