// Engine error taxonomy.
//
// "Nothing to do" is never an error: the engine answers `Ok(None)` for it.

use thiserror::Error;

use crate::title::TitleError;

/// Failure reported by a host collaborator (page storage, corpus query).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("page not found: {0}")]
    NotFound(String),

    #[error("provider backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    pub fn backend(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(error.into())
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    /// The source was built without an identity and without a page to derive
    /// one from.
    #[error("source has no title and no page to derive one from")]
    MissingIdentity,

    /// The source has no text and no identity to load it by.
    #[error("source has no text and no title to load it from")]
    MissingText,

    #[error(transparent)]
    Title(#[from] TitleError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A protected-span or title pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
