/// Crate-wide result alias.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors surfaced at the crate boundary.
///
/// Inside a render pass, missing cells and degenerate geometry are logged and skipped; only
/// boundary validation and invariant violations reach the caller through this type.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// Caller-supplied input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The design snapshot is inconsistent (dangling references, cycles, duplicate names).
    #[error("design error: {0}")]
    Design(String),

    /// A render pass aborted on an invariant violation.
    #[error("render error: {0}")]
    Render(String),

    /// JSON decoding failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RasterError {
    /// Build a [`RasterError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RasterError::Design`].
    pub fn design(msg: impl Into<String>) -> Self {
        Self::Design(msg.into())
    }

    /// Build a [`RasterError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`RasterError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
