use std::fmt::Display;
use std::path::Path;

/// Convenience result type used across gltf-stow.
pub type StowResult<T> = Result<T, StowError>;

/// Top-level error taxonomy used by the resource writer.
#[derive(thiserror::Error, Debug)]
pub enum StowError {
    /// Invalid document data, options, or an unsupported resource format.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external codec reported an error or exited with a non-zero status.
    #[error("transcode error: {0}")]
    Transcode(String),

    /// Reading, writing, or deleting a temporary or output file failed.
    #[error("filesystem error: {0}")]
    FileSystem(String),

    /// Errors when serializing or deserializing the document.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StowError {
    /// Build a [`StowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StowError::Transcode`] value.
    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::Transcode(msg.into())
    }

    /// Build a [`StowError::FileSystem`] value.
    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::FileSystem(msg.into())
    }

    /// Build a [`StowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`StowError::FileSystem`] value for an IO failure on `path`.
    pub fn io(action: &str, path: &Path, err: impl Display) -> Self {
        Self::FileSystem(format!("failed to {action} '{}': {err}", path.display()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
