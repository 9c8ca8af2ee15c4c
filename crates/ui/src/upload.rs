//! Render-thread texture creation

use filechooser_cache::GpuTexture;
use filechooser_render::Pixmap;

/// Default largest texture edge accepted by [`SoftwareUploader`]
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 8192;

/// Errors raised while creating a texture
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("texture {width}x{height} exceeds the {max} pixel limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("texture upload failed: {0}")]
    Backend(String),
}

/// Turns decoded pixels into a texture
///
/// Called only on the render thread, never on the worker.
pub trait TextureUploader {
    fn upload(&mut self, pixmap: Pixmap) -> Result<GpuTexture, UploadError>;
}

/// Uploader for headless hosts
///
/// Keeps the pixmap itself as the texture handle, so the pixels can be
/// read back with `GpuTexture::handle::<Pixmap>()`.
#[derive(Debug, Clone)]
pub struct SoftwareUploader {
    max_texture_size: u32,
    uploaded: usize,
    uploaded_bytes: usize,
}

impl SoftwareUploader {
    pub fn new() -> Self {
        Self {
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
            uploaded: 0,
            uploaded_bytes: 0,
        }
    }

    pub fn with_max_texture_size(mut self, max: u32) -> Self {
        self.max_texture_size = max;
        self
    }

    /// Number of textures created so far
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }
}

impl Default for SoftwareUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureUploader for SoftwareUploader {
    fn upload(&mut self, pixmap: Pixmap) -> Result<GpuTexture, UploadError> {
        let (width, height) = (pixmap.width(), pixmap.height());
        if width > self.max_texture_size || height > self.max_texture_size {
            return Err(UploadError::TooLarge {
                width,
                height,
                max: self.max_texture_size,
            });
        }

        let size = pixmap.byte_len();
        self.uploaded += 1;
        self.uploaded_bytes += size;
        Ok(GpuTexture::new(pixmap, width, height, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixmap(width: u32, height: u32) -> Pixmap {
        let pixels = vec![0xFF0000FF; (width * height) as usize];
        Pixmap::from_packed_rgba8888(width, height, &pixels, false).unwrap()
    }

    #[test]
    fn test_software_upload_keeps_pixels() {
        let mut uploader = SoftwareUploader::new();
        let texture = uploader.upload(pixmap(4, 2)).unwrap();

        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.vram_size(), 32);
        let pixels = texture.handle::<Pixmap>().unwrap();
        assert_eq!(pixels.pixel(3, 1), [255, 0, 0, 255]);

        assert_eq!(uploader.uploaded(), 1);
        assert_eq!(uploader.uploaded_bytes(), 32);
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let mut uploader = SoftwareUploader::default().with_max_texture_size(2);
        let err = uploader.upload(pixmap(3, 1)).unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { width: 3, .. }));
        assert_eq!(uploader.uploaded(), 0);
    }
}
