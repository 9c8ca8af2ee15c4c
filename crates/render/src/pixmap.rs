//! CPU-side pixel buffers
//!
//! A `Pixmap` is what backends hand from the worker thread to the render
//! thread. It is plain owned bytes in row-major order, top row first, ready
//! to be uploaded as a texture.

use image::{DynamicImage, Rgba, RgbaImage};

/// Channel layout of a `Pixmap`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: red, green, blue, alpha
    Rgba8888,
    /// 3 bytes per pixel: red, green, blue (always opaque)
    Rgb888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
            PixelFormat::Rgb888 => 3,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelFormat::Rgba8888)
    }
}

/// Error for pixel buffers whose length does not match their dimensions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixmapError {
    #[error("pixmap dimensions {width}x{height} are empty")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("expected {expected} pixels, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Decoded thumbnail pixels
#[derive(Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Pixmap {
    /// Convert a decoded image, keeping an alpha channel only if the source has one
    ///
    /// Every pixel is packed as `0xAARRGGBB` and unpacked through
    /// [`Pixmap::from_argb8888`].
    pub fn from_image(image: &DynamicImage) -> Result<Self, PixmapError> {
        let pixels: Vec<u32> = image
            .to_rgba8()
            .pixels()
            .map(|&Rgba([r, g, b, a])| u32::from_be_bytes([a, r, g, b]))
            .collect();
        Self::from_argb8888(
            image.width(),
            image.height(),
            &pixels,
            image.color().has_alpha(),
        )
    }

    /// Unpack 32-bit `0xAARRGGBB` pixels
    ///
    /// Without an alpha channel the top byte is ignored and the result is an
    /// opaque `Rgb888` pixmap.
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `pixels` - Row-major pixels, top row first
    /// * `has_alpha` - Whether the top byte carries alpha
    pub fn from_argb8888(
        width: u32,
        height: u32,
        pixels: &[u32],
        has_alpha: bool,
    ) -> Result<Self, PixmapError> {
        check_len(width, height, pixels.len())?;

        let format = if has_alpha {
            PixelFormat::Rgba8888
        } else {
            PixelFormat::Rgb888
        };
        let mut data = Vec::with_capacity(pixels.len() * format.bytes_per_pixel());
        for &pixel in pixels {
            let [a, r, g, b] = pixel.to_be_bytes();
            data.extend_from_slice(&[r, g, b]);
            if has_alpha {
                data.push(a);
            }
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Unpack 32-bit `0xRRGGBBAA` pixels
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `pixels` - Row-major pixels
    /// * `bottom_up` - Rows are stored bottom row first
    pub fn from_packed_rgba8888(
        width: u32,
        height: u32,
        pixels: &[u32],
        bottom_up: bool,
    ) -> Result<Self, PixmapError> {
        check_len(width, height, pixels.len())?;

        let row_len = width as usize;
        let mut data = Vec::with_capacity(pixels.len() * 4);
        for row in 0..height as usize {
            let source_row = if bottom_up {
                height as usize - 1 - row
            } else {
                row
            };
            let start = source_row * row_len;
            for &pixel in &pixels[start..start + row_len] {
                data.extend_from_slice(&pixel.to_be_bytes());
            }
        }

        Ok(Self {
            width,
            height,
            format: PixelFormat::Rgba8888,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw bytes, row-major, top row first
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the pixel data in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Read one pixel as RGBA; `Rgb888` pixels read as opaque
    ///
    /// Returns transparent black for coordinates outside the pixmap.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }

        let bpp = self.format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        let px = &self.data[offset..offset + bpp];
        match self.format {
            PixelFormat::Rgba8888 => [px[0], px[1], px[2], px[3]],
            PixelFormat::Rgb888 => [px[0], px[1], px[2], 255],
        }
    }

    /// Expand to an RGBA image, e.g. for writing a PNG
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| Rgba(self.pixel(x, y)))
    }
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn check_len(width: u32, height: u32, actual: usize) -> Result<(), PixmapError> {
    if width == 0 || height == 0 {
        return Err(PixmapError::EmptyDimensions { width, height });
    }

    let expected = width as usize * height as usize;
    if expected != actual {
        return Err(PixmapError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_from_image_keeps_alpha() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 40]));

        let pixmap = Pixmap::from_image(&DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(pixmap.format(), PixelFormat::Rgba8888);
        assert_eq!(pixmap.byte_len(), 8);
        assert_eq!(pixmap.pixel(1, 0), [10, 20, 30, 40]);
    }

    #[test]
    fn test_from_image_without_alpha_is_opaque() {
        let mut rgb = RgbImage::new(3, 2);
        rgb.put_pixel(2, 1, Rgb([200, 100, 50]));

        let pixmap = Pixmap::from_image(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(pixmap.format(), PixelFormat::Rgb888);
        assert_eq!(pixmap.byte_len(), 18);
        assert_eq!(pixmap.pixel(2, 1), [200, 100, 50, 255]);
        assert_eq!(pixmap.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_from_empty_image_rejected() {
        assert!(matches!(
            Pixmap::from_image(&DynamicImage::new_rgb8(0, 3)),
            Err(PixmapError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_argb_unpack_with_alpha() {
        let pixmap = Pixmap::from_argb8888(2, 1, &[0x80FF0000, 0x0000FF00], true).unwrap();

        assert_eq!(pixmap.format(), PixelFormat::Rgba8888);
        assert_eq!(pixmap.pixel(0, 0), [255, 0, 0, 128]);
        assert_eq!(pixmap.pixel(1, 0), [0, 255, 0, 0]);
    }

    #[test]
    fn test_argb_unpack_without_alpha_ignores_top_byte() {
        let pixmap = Pixmap::from_argb8888(1, 1, &[0x000000FF], false).unwrap();

        assert_eq!(pixmap.format(), PixelFormat::Rgb888);
        assert_eq!(pixmap.data(), &[0, 0, 255]);
        assert_eq!(pixmap.pixel(0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_packed_rgba_bottom_up_flips_rows() {
        let red = 0xFF0000FF;
        let blue = 0x0000FFFF;
        // Bottom row first: red is the bottom row
        let pixmap = Pixmap::from_packed_rgba8888(1, 2, &[red, blue], true).unwrap();

        assert_eq!(pixmap.pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(pixmap.pixel(0, 1), [255, 0, 0, 255]);

        let pixmap = Pixmap::from_packed_rgba8888(1, 2, &[red, blue], false).unwrap();
        assert_eq!(pixmap.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert_eq!(
            Pixmap::from_packed_rgba8888(2, 2, &[0; 3], false),
            Err(PixmapError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            Pixmap::from_argb8888(0, 5, &[], true),
            Err(PixmapError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let pixmap = Pixmap::from_argb8888(1, 1, &[0xFFFFFFFF], true).unwrap();
        assert_eq!(pixmap.pixel(1, 0), [0, 0, 0, 0]);
        assert_eq!(pixmap.pixel(0, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn test_to_rgba8() {
        let pixmap = Pixmap::from_argb8888(2, 1, &[0xFF112233, 0xFF445566], false).unwrap();
        let image = pixmap.to_rgba8();

        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0), &Rgba([0x44, 0x55, 0x66, 255]));
    }
}
