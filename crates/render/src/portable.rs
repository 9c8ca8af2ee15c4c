//! Portable backend: decode with `image`, scale on the CPU

use crate::backend::{ThumbnailBackend, ThumbnailRequest};
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::pixmap::Pixmap;
use crate::probe::{self, ImageSize};
use filechooser_scheduler::CancellationToken;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use std::path::Path;

/// Cross-platform thumbnail backend
///
/// Probes the source header first: oversized sources are rejected, sources
/// smaller than the target are loaded at native resolution, everything else
/// is decoded and scaled so its longer edge equals the target size. The
/// cancellation token is checked after the probe and before the resize.
///
/// # Example
///
/// ```no_run
/// use filechooser_render::{CancellationToken, PortableBackend, ThumbnailBackend, ThumbnailRequest};
///
/// let backend = PortableBackend::new();
/// let token = CancellationToken::new();
/// let pixmap = backend.generate(&ThumbnailRequest::new("photo.jpg", 256), &token)?;
/// assert!(pixmap.width() <= 256 && pixmap.height() <= 256);
/// # Ok::<(), filechooser_render::ThumbnailError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PortableBackend {
    filter: FilterType,
}

impl PortableBackend {
    /// Create a backend using a balanced speed/quality resampler
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Use a different resampling filter
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    fn decode(path: &Path) -> ThumbnailResult<DynamicImage> {
        image::open(path).map_err(|err| match err {
            ImageError::IoError(io) => ThumbnailError::Io(io),
            other => ThumbnailError::decode(path, other.to_string()),
        })
    }

    fn to_pixmap(path: &Path, image: &DynamicImage) -> ThumbnailResult<Pixmap> {
        Pixmap::from_image(image).map_err(|err| ThumbnailError::decode(path, err.to_string()))
    }
}

impl Default for PortableBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailBackend for PortableBackend {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn generate(
        &self,
        request: &ThumbnailRequest,
        token: &CancellationToken,
    ) -> ThumbnailResult<Pixmap> {
        let path = request.path.as_path();
        request.check_cancelled(token)?;
        let size = match request.source_size {
            Some(size) => size,
            None => probe::probe_dimensions(path)?.size,
        };
        request.check_cancelled(token)?;

        if size.exceeds(request.max_source) {
            return Err(ThumbnailError::unsupported(
                path,
                format!("{} exceeds {}", size, request.max_source),
            ));
        }

        let image = Self::decode(path)?;

        if size.is_smaller_than(request.target_size) {
            log::debug!(
                "{} is {}, below target {}; loading natively",
                path.display(),
                size,
                request.target_size
            );
            return Self::to_pixmap(path, &image);
        }

        request.check_cancelled(token)?;
        let scaled = image.resize(request.target_size, request.target_size, self.filter);
        log::debug!(
            "scaled {} from {} to {}",
            path.display(),
            size,
            ImageSize::new(scaled.width(), scaled.height())
        );
        Self::to_pixmap(path, &scaled)
    }
}
