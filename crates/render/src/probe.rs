//! Header-only image dimension probing
//!
//! Reads just enough of a JPEG, PNG or BMP file to learn its pixel size,
//! so oversized sources can be rejected and small ones loaded as-is
//! without a full decode. Other formats fall back to the `image` crate's
//! header reader.

use crate::error::{ThumbnailError, ThumbnailResult};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Pixel dimensions of a source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either axis is larger than `max`
    pub fn exceeds(&self, max: ImageSize) -> bool {
        self.width > max.width || self.height > max.height
    }

    /// Whether either axis is smaller than `target`
    ///
    /// Such images are shown at native resolution instead of being scaled.
    pub fn is_smaller_than(&self, target: u32) -> bool {
        self.width < target || self.height < target
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Container format recognized by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatKind {
    Jpeg,
    Png,
    Bmp,
    /// Any format the `image` crate can read a header for
    Other,
}

impl ImageFormatKind {
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormatKind::Jpeg => "jpeg",
            ImageFormatKind::Png => "png",
            ImageFormatKind::Bmp => "bmp",
            ImageFormatKind::Other => "other",
        }
    }
}

/// Result of probing an image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    pub format: ImageFormatKind,
    pub size: ImageSize,
}

const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const BMP_MAGIC: [u8; 2] = [b'B', b'M'];
const BMP_CORE_HEADER_SIZE: u32 = 12;
const BMP_MIN_INFO_HEADER_SIZE: u32 = 16;

/// Probe the dimensions of an image file
///
/// # Errors
///
/// `Io` if the file cannot be opened, `DecodeFailure` if the header is
/// truncated, corrupt or of an unknown format.
pub fn probe_dimensions(path: &Path) -> ThumbnailResult<ImageProbe> {
    let file = File::open(path)?;

    match probe_reader(BufReader::new(file)) {
        Ok(Some(probe)) => Ok(probe),
        Ok(None) => probe_with_image(path),
        Err(err) => Err(ThumbnailError::decode(
            path,
            format!("unreadable image header: {}", err),
        )),
    }
}

/// Probe a JPEG, PNG or BMP header from a stream
///
/// Returns `Ok(None)` when the stream is not one of those formats and an
/// `InvalidData`/`UnexpectedEof` error when it is but the header is broken.
pub fn probe_reader<R: Read>(mut reader: R) -> io::Result<Option<ImageProbe>> {
    let mut magic = [0u8; 8];
    let read = read_up_to(&mut reader, &mut magic)?;
    let magic = &magic[..read];

    if magic.starts_with(&JPEG_MAGIC) {
        let size = probe_jpeg(&magic[2..], reader)?;
        Ok(Some(ImageProbe {
            format: ImageFormatKind::Jpeg,
            size,
        }))
    } else if magic.starts_with(&PNG_MAGIC) {
        let size = probe_png(reader)?;
        Ok(Some(ImageProbe {
            format: ImageFormatKind::Png,
            size,
        }))
    } else if magic.starts_with(&BMP_MAGIC) {
        let size = probe_bmp(&magic[2..], reader)?;
        Ok(Some(ImageProbe {
            format: ImageFormatKind::Bmp,
            size,
        }))
    } else {
        Ok(None)
    }
}

/// Walk JPEG segments until a start-of-frame marker
///
/// `prefix` holds bytes already consumed after the SOI marker.
fn probe_jpeg<R: Read>(prefix: &[u8], reader: R) -> io::Result<ImageSize> {
    let mut reader = prefix.chain(reader);

    loop {
        if read_u8(&mut reader)? != 0xFF {
            return Err(invalid("expected JPEG marker"));
        }
        let mut marker = read_u8(&mut reader)?;
        while marker == 0xFF {
            marker = read_u8(&mut reader)?;
        }

        match marker {
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return Err(invalid("no frame header before image data")),
            _ => {}
        }

        let len = read_u16_be(&mut reader)?;
        if len < 2 {
            return Err(invalid("JPEG segment length too short"));
        }

        // Baseline, extended sequential, progressive
        if matches!(marker, 0xC0..=0xC2) {
            let _precision = read_u8(&mut reader)?;
            let height = read_u16_be(&mut reader)?;
            let width = read_u16_be(&mut reader)?;
            return sized(width as u32, height as u32);
        }

        skip(&mut reader, u64::from(len) - 2)?;
    }
}

fn probe_png<R: Read>(mut reader: R) -> io::Result<ImageSize> {
    let _chunk_len = read_u32_be(&mut reader)?;
    let mut chunk_type = [0u8; 4];
    reader.read_exact(&mut chunk_type)?;
    if &chunk_type != b"IHDR" {
        return Err(invalid("PNG does not start with IHDR"));
    }

    let width = read_u32_be(&mut reader)?;
    let height = read_u32_be(&mut reader)?;
    sized(width, height)
}

/// BMP dimensions from the info header
///
/// A 12 byte BITMAPCOREHEADER stores unsigned 16-bit sizes. Every later
/// header stores signed 32-bit sizes, where a negative height marks a
/// top-down bitmap.
fn probe_bmp<R: Read>(prefix: &[u8], reader: R) -> io::Result<ImageSize> {
    let mut reader = prefix.chain(reader);

    // Rest of the 14 byte file header
    skip(&mut reader, 12)?;

    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let header_size = u32::from_le_bytes(buf);

    match header_size {
        BMP_CORE_HEADER_SIZE => {
            let mut half = [0u8; 2];
            reader.read_exact(&mut half)?;
            let width = u16::from_le_bytes(half);
            reader.read_exact(&mut half)?;
            let height = u16::from_le_bytes(half);
            sized(u32::from(width), u32::from(height))
        }
        size if size < BMP_MIN_INFO_HEADER_SIZE => Err(invalid("unknown BMP info header size")),
        _ => {
            reader.read_exact(&mut buf)?;
            let width = i32::from_le_bytes(buf);
            reader.read_exact(&mut buf)?;
            let height = i32::from_le_bytes(buf);

            if width <= 0 {
                return Err(invalid("BMP width must be positive"));
            }
            sized(width.unsigned_abs(), height.unsigned_abs())
        }
    }
}

fn probe_with_image(path: &Path) -> ThumbnailResult<ImageProbe> {
    let reader = image::ImageReader::open(path)?
        .with_guessed_format()
        .map_err(|err| ThumbnailError::decode(path, err.to_string()))?;

    if reader.format().is_none() {
        return Err(ThumbnailError::decode(path, "unrecognized image format"));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| ThumbnailError::decode(path, err.to_string()))?;

    Ok(ImageProbe {
        format: ImageFormatKind::Other,
        size: ImageSize::new(width, height),
    })
}

fn sized(width: u32, height: u32) -> io::Result<ImageSize> {
    if width == 0 || height == 0 {
        return Err(invalid("image has zero dimension"));
    }
    Ok(ImageSize::new(width, height))
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16_be<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn skip<R: Read>(reader: &mut R, count: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(count), &mut io::sink())?;
    if skipped < count {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}
