//! Thumbnail generation errors

use std::io;
use std::path::PathBuf;

/// Result type for thumbnail generation
pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

/// Errors raised by thumbnail backends
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    /// The source cannot be thumbnailed (too large, or the backend refused it)
    #[error("unsupported source {path}: {reason}")]
    UnsupportedSource { path: PathBuf, reason: String },

    /// The source could not be read or decoded
    #[error("failed to decode {path}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },

    /// The native backend was requested on a platform without it
    #[error("native thumbnails are not supported on this platform")]
    PlatformUnsupported,

    /// The provider or cache was disposed before the operation ran
    #[error("thumbnail provider has been disposed")]
    ResourceDisposed,

    /// The worker was cancelled while the request was running
    #[error("thumbnail generation cancelled for {0}")]
    Cancelled(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ThumbnailError {
    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ThumbnailError::UnsupportedSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ThumbnailError::DecodeFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is transient
    ///
    /// Cancelled requests and interrupted or timed out reads are transient.
    /// A file that is missing, failed to decode or was rejected fails the
    /// same way every time. Either kind is only attempted again after the
    /// next reset.
    pub fn is_retryable(&self) -> bool {
        match self {
            ThumbnailError::Cancelled(_) => true,
            ThumbnailError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
