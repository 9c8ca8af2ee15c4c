//! Native backend: delegate to the operating system's shell thumbnails

use crate::backend::{ThumbnailBackend, ThumbnailRequest};
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::pixmap::Pixmap;
use filechooser_scheduler::CancellationToken;
use std::path::{Path, MAIN_SEPARATOR};

/// Platform thumbnail extraction capability
///
/// `get_thumbnail` returns `[width, height, pixels...]` where each pixel is
/// a packed `0xRRGGBBAA` value and rows are stored bottom row first, or
/// `None` if the shell has no thumbnail for the file.
pub trait ShellThumbnails: Send + Sync + 'static {
    /// Whether the capability works on the running OS
    fn is_platform_supported() -> bool
    where
        Self: Sized;

    fn get_thumbnail(&self, path: &str, size: u32) -> Option<Vec<i32>>;
}

/// Thumbnail backend backed by the OS shell
///
/// Check [`NativeBackend::is_platform_supported`] before constructing one;
/// construction fails on platforms without the capability.
pub struct NativeBackend<S> {
    shell: S,
}

impl<S: ShellThumbnails> NativeBackend<S> {
    /// Wrap a shell capability
    ///
    /// # Errors
    ///
    /// `PlatformUnsupported` if the capability is unavailable on this OS.
    pub fn new(shell: S) -> ThumbnailResult<Self> {
        if !S::is_platform_supported() {
            return Err(ThumbnailError::PlatformUnsupported);
        }
        Ok(Self { shell })
    }

    pub fn is_platform_supported() -> bool {
        S::is_platform_supported()
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }
}

impl<S: ShellThumbnails> ThumbnailBackend for NativeBackend<S> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn generate(
        &self,
        request: &ThumbnailRequest,
        token: &CancellationToken,
    ) -> ThumbnailResult<Pixmap> {
        let path = request.path.as_path();
        let native = native_path(path)?;
        request.check_cancelled(token)?;

        let buffer = self
            .shell
            .get_thumbnail(&native, request.target_size)
            .ok_or_else(|| ThumbnailError::decode(path, "shell returned no thumbnail"))?;
        request.check_cancelled(token)?;

        decode_shell_buffer(path, &buffer)
    }
}

/// Path string with the platform's separator
///
/// The shell takes UTF-8 strings, so other paths are unsupported.
fn native_path(path: &Path) -> ThumbnailResult<String> {
    let Some(path_str) = path.to_str() else {
        return Err(ThumbnailError::unsupported(path, "path is not valid UTF-8"));
    };

    if MAIN_SEPARATOR == '/' {
        Ok(path_str.to_string())
    } else {
        Ok(path_str.replace('/', &MAIN_SEPARATOR.to_string()))
    }
}

/// Convert a `[width, height, pixels...]` buffer into a top-down pixmap
pub fn decode_shell_buffer(path: &Path, buffer: &[i32]) -> ThumbnailResult<Pixmap> {
    let [width, height, pixels @ ..] = buffer else {
        return Err(ThumbnailError::decode(path, "shell buffer has no header"));
    };

    let (Ok(width), Ok(height)) = (u32::try_from(*width), u32::try_from(*height)) else {
        return Err(ThumbnailError::decode(
            path,
            format!("invalid shell thumbnail size {}x{}", width, height),
        ));
    };

    let pixels: Vec<u32> = pixels.iter().map(|&pixel| pixel as u32).collect();
    Pixmap::from_packed_rgba8888(width, height, &pixels, true)
        .map_err(|err| ThumbnailError::decode(path, err.to_string()))
}
