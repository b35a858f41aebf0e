/// Result type used across the crate.
pub type BackdropResult<T> = Result<T, BackdropError>;

/// Errors surfaced by attach, configure and explicit render operations.
///
/// Scheduled ticks absorb every variant except the ones raised by the caller's own request, so a
/// failing tick leaves the last good frame on the visible surface.
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    /// The host handed over an object that is not an image, video or generated-frame source.
    #[error("unsupported source kind: {0}")]
    UnsupportedSourceKind(String),

    /// Layout flags did not resolve to exactly one mode.
    #[error("ambiguous layout: {0}")]
    AmbiguousLayout(String),

    /// The source has no drawable frame yet.
    #[error("source not ready")]
    SourceNotReady,

    /// Malformed buffers or options.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackdropError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedSourceKind(msg.into())
    }

    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::AmbiguousLayout(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Hard failures are reported to the caller; everything else is absorbed per tick.
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSourceKind(_) | Self::AmbiguousLayout(_)
        )
    }
}
