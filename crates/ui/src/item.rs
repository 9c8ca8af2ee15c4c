//! File items shown by the chooser

use filechooser_render::ImageSize;
use std::path::{Path, PathBuf};

/// One entry of the directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    /// Absolute path, also the thumbnail cache key
    pub source: PathBuf,

    /// Pixel dimensions if the host already knows them
    pub native_size: Option<ImageSize>,

    pub is_directory: bool,
}

impl FileItem {
    pub fn file(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            native_size: None,
            is_directory: false,
        }
    }

    pub fn directory(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            native_size: None,
            is_directory: true,
        }
    }

    pub fn with_native_size(mut self, width: u32, height: u32) -> Self {
        self.native_size = Some(ImageSize::new(width, height));
        self
    }

    pub fn path(&self) -> &Path {
        &self.source
    }

    /// Lowercase file extension
    pub fn extension(&self) -> Option<String> {
        self.source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}
