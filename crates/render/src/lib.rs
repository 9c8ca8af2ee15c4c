//! File Chooser Thumbnail Rendering
//!
//! Backend strategies that turn a source file into thumbnail pixels on the
//! background worker: a portable decode-and-scale backend built on the
//! `image` crate and a native backend that defers to the OS shell.

pub mod backend;
pub mod error;
pub mod native;
pub mod pixmap;
pub mod portable;
pub mod probe;

pub use backend::{ThumbnailBackend, ThumbnailRequest, MAX_SOURCE_SIZE};
pub use error::{ThumbnailError, ThumbnailResult};
pub use native::{NativeBackend, ShellThumbnails};
pub use pixmap::{PixelFormat, Pixmap, PixmapError};
pub use portable::PortableBackend;
pub use probe::{probe_dimensions, ImageFormatKind, ImageProbe, ImageSize};

pub use filechooser_scheduler::CancellationToken;
