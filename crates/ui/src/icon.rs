//! Icons returned to the file chooser

use crate::item::FileItem;
use filechooser_cache::TextureRegion;

/// Generic icon for a kind of file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileIcon {
    Folder,
    Image,
    Audio,
    Text,
    Pdf,
    Archive,
    Generic,
}

/// What the chooser draws for an item this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    /// A generated thumbnail
    Thumbnail(TextureRegion),
    /// Placeholder shown until (or instead of) a thumbnail
    FileType(FileIcon),
}

impl Icon {
    pub fn is_thumbnail(&self) -> bool {
        matches!(self, Icon::Thumbnail(_))
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "xml", "toml", "csv", "log"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "xz"];

/// Fallback icon lookup by file type
///
/// Cheap enough to call on every draw. Also decides which files are images
/// and therefore eligible for thumbnails.
#[derive(Debug, Clone, Default)]
pub struct FileTypeIcons {
    extra_image_extensions: Vec<String>,
}

impl FileTypeIcons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat another extension as an image (case-insensitive)
    pub fn with_image_extension(mut self, extension: &str) -> Self {
        self.extra_image_extensions
            .push(extension.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn icon_for(&self, item: &FileItem) -> FileIcon {
        if item.is_directory {
            return FileIcon::Folder;
        }

        let Some(ext) = item.extension() else {
            return FileIcon::Generic;
        };
        let ext = ext.as_str();

        if self.is_image_extension(ext) {
            FileIcon::Image
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileIcon::Audio
        } else if TEXT_EXTENSIONS.contains(&ext) {
            FileIcon::Text
        } else if ext == "pdf" {
            FileIcon::Pdf
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            FileIcon::Archive
        } else {
            FileIcon::Generic
        }
    }

    /// Whether thumbnails are generated for this item
    pub fn is_image(&self, item: &FileItem) -> bool {
        self.icon_for(item) == FileIcon::Image
    }

    fn is_image_extension(&self, ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext) || self.extra_image_extensions.iter().any(|e| e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_for() {
        let icons = FileTypeIcons::new();

        assert_eq!(icons.icon_for(&FileItem::directory("/home")), FileIcon::Folder);
        assert_eq!(icons.icon_for(&FileItem::file("a.PNG")), FileIcon::Image);
        assert_eq!(icons.icon_for(&FileItem::file("song.mp3")), FileIcon::Audio);
        assert_eq!(icons.icon_for(&FileItem::file("notes.txt")), FileIcon::Text);
        assert_eq!(icons.icon_for(&FileItem::file("paper.pdf")), FileIcon::Pdf);
        assert_eq!(icons.icon_for(&FileItem::file("src.tar")), FileIcon::Archive);
        assert_eq!(icons.icon_for(&FileItem::file("Makefile")), FileIcon::Generic);
        assert_eq!(icons.icon_for(&FileItem::file("a.exe")), FileIcon::Generic);
    }

    #[test]
    fn test_directory_named_like_image_is_folder() {
        let icons = FileTypeIcons::new();
        let item = FileItem::directory("/photos/backup.png");

        assert_eq!(icons.icon_for(&item), FileIcon::Folder);
        assert!(!icons.is_image(&item));
    }

    #[test]
    fn test_extra_image_extension() {
        let icons = FileTypeIcons::new().with_image_extension(".WebP");

        assert!(icons.is_image(&FileItem::file("a.webp")));
        assert!(!FileTypeIcons::new().is_image(&FileItem::file("a.webp")));
    }
}
