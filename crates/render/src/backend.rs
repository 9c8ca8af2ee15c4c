//! Backend strategy contract

use crate::error::{ThumbnailError, ThumbnailResult};
use crate::pixmap::Pixmap;
use crate::probe::ImageSize;
use filechooser_scheduler::CancellationToken;
use std::path::PathBuf;

/// Largest source accepted for thumbnailing in either axis
pub const MAX_SOURCE_SIZE: ImageSize = ImageSize::new(4096, 4096);

/// One thumbnail to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    /// Source file
    pub path: PathBuf,

    /// Edge length of the square the thumbnail must fit in
    pub target_size: u32,

    /// Source dimensions if the host already knows them
    pub source_size: Option<ImageSize>,

    /// Sources larger than this in either axis are rejected
    pub max_source: ImageSize,
}

impl ThumbnailRequest {
    pub fn new(path: impl Into<PathBuf>, target_size: u32) -> Self {
        Self {
            path: path.into(),
            target_size,
            source_size: None,
            max_source: MAX_SOURCE_SIZE,
        }
    }

    pub fn with_source_size(mut self, size: Option<ImageSize>) -> Self {
        self.source_size = size;
        self
    }

    pub fn with_max_source(mut self, max: ImageSize) -> Self {
        self.max_source = max;
        self
    }

    /// Fail with `Cancelled` once `token` has been cancelled
    pub fn check_cancelled(&self, token: &CancellationToken) -> ThumbnailResult<()> {
        if token.is_cancelled() {
            return Err(ThumbnailError::Cancelled(self.path.clone()));
        }
        Ok(())
    }
}

/// A strategy that turns a source file into thumbnail pixels
///
/// Implementations run on the background worker. They must only read the
/// file system and return owned pixels; texture creation happens later on
/// the render thread. A reset cancels `token`; implementations check it
/// between their expensive steps and return `Cancelled` so the replacement
/// worker can start on the new directory.
pub trait ThumbnailBackend: Send + Sync + 'static {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Produce a thumbnail for `request`
    fn generate(
        &self,
        request: &ThumbnailRequest,
        token: &CancellationToken,
    ) -> ThumbnailResult<Pixmap>;
}
