//! File Chooser UI Library
//!
//! Icon provider with cached, asynchronously generated thumbnails for a
//! file chooser widget, plus small overlay helpers: pinned widgets and
//! regex text highlighting.

pub mod geometry;
pub mod highlight;
pub mod icon;
pub mod item;
pub mod pin;
pub mod provider;
pub mod upload;
pub mod view;

pub use geometry::{Color, Rect};
pub use highlight::{Highlight, HighlightRule, RegexHighlightRule};
pub use icon::{FileIcon, FileTypeIcons, Icon};
pub use item::FileItem;
pub use pin::{ActorId, ActorLookup, Pin, PinFrame, PositionMode, SizeMode};
pub use provider::{IconProvider, ProviderError, ProviderStats, ThumbnailKey, ThumbnailState};
pub use upload::{SoftwareUploader, TextureUploader, UploadError};
pub use view::ViewMode;
