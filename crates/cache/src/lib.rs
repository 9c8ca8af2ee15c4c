//! File Chooser Thumbnail Cache
//!
//! Bounded, insertion-ordered cache of per-file thumbnail records. Each
//! record holds up to one GPU texture per display tier; evicted records
//! release their textures synchronously on the render thread.

pub mod config;
pub mod record;
pub mod texture;
pub mod thumbnails;

pub use config::{ConfigError, GridSizes, ThumbnailConfig};
pub use record::{RecordId, ThumbnailRecord, Tier};
pub use texture::{GpuTexture, TextureId, TextureRegion};
pub use thumbnails::{CacheStats, ThumbnailCache, DEFAULT_CAPACITY};
