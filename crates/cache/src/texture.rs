//! GPU-resident thumbnail textures
//!
//! Textures are created and dropped on the render thread only. The backend
//! handle is stored type-erased so the cache works with any graphics API;
//! dropping a [`GpuTexture`] drops the handle, which releases the backend
//! resource.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    /// Create a new unique texture ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the ID
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for TextureId {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU texture handle
///
/// Owns a platform-specific texture object. Uses a trait object so the same
/// record type can hold Metal, GL, wgpu or purely software textures.
pub struct GpuTexture {
    id: TextureId,

    /// Opaque handle to the backend texture
    handle: Box<dyn Any>,

    /// Width of the texture in pixels
    pub width: u32,

    /// Height of the texture in pixels
    pub height: u32,

    /// Estimated VRAM usage in bytes
    vram_size: usize,
}

impl GpuTexture {
    /// Wrap a backend texture handle
    ///
    /// # Arguments
    ///
    /// * `handle` - Platform-specific texture handle, released when dropped
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `vram_size` - Estimated VRAM usage in bytes
    pub fn new<T: 'static>(handle: T, width: u32, height: u32, vram_size: usize) -> Self {
        Self {
            id: TextureId::new(),
            handle: Box::new(handle),
            width,
            height,
            vram_size,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the estimated VRAM size of this texture in bytes
    pub fn vram_size(&self) -> usize {
        self.vram_size
    }

    /// Get a reference to the underlying texture handle
    ///
    /// Returns `None` if the type doesn't match.
    pub fn handle<T: 'static>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }

    /// Drawable view of the whole texture
    pub fn region(&self) -> TextureRegion {
        TextureRegion {
            texture: self.id,
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("vram_size", &self.vram_size)
            .finish_non_exhaustive()
    }
}

/// Drawable region of a texture, cheap to copy into every draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    /// Texture the region samples from
    pub texture: TextureId,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}
