//! Caching, asynchronous thumbnail icon provider
//!
//! The file chooser calls [`IconProvider::get_icon`] for every visible item
//! on every frame. The provider answers immediately from the cache or with a
//! file-type placeholder, and queues at most one generation job per file and
//! tier. Finished jobs are turned into textures on the render thread by
//! [`IconProvider::process_completions`].

use crate::icon::{FileTypeIcons, Icon};
use crate::item::FileItem;
use crate::upload::TextureUploader;
use crate::view::ViewMode;
use filechooser_cache::{CacheStats, ConfigError, ThumbnailCache, ThumbnailConfig, Tier};
use filechooser_render::{
    ImageSize, NativeBackend, Pixmap, ShellThumbnails, ThumbnailBackend, ThumbnailError,
    ThumbnailRequest,
};
use filechooser_scheduler::{
    Completion, GenerationScheduler, JobOutcome, SchedulerError, SchedulerStats,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Identity of a generation job: one per file and tier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub source: PathBuf,
    pub tier: Tier,
}

type ThumbnailScheduler = GenerationScheduler<ThumbnailKey, Pixmap, ThumbnailError>;

/// Thumbnail status of one item in the current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailState {
    /// No thumbnail is shown for this item in this mode
    NotApplicable,
    /// Not generated yet; queued, running, or queued on the next `get_icon`
    Pending,
    /// A texture exists for this tier
    Ready,
    /// Generation failed; the placeholder stays until the next reset
    Failed,
}

/// Errors raised while constructing or resetting a provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Backend(#[from] ThumbnailError),
}

/// Provider statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProviderStats {
    /// Calls to `get_icon`
    pub icon_requests: u64,

    /// Icons answered with a cached thumbnail
    pub thumbnails_served: u64,

    /// Generation jobs queued
    pub jobs_scheduled: u64,

    /// Sources skipped because their known size exceeds the limit
    pub oversized_skipped: u64,

    /// Textures created from finished jobs
    pub textures_uploaded: u64,

    /// Jobs that failed, panicked, or whose texture upload failed
    pub failures: u64,

    /// Finished thumbnails dropped because their record was evicted
    pub released_after_eviction: u64,

    pub cache: CacheStats,

    pub scheduler: SchedulerStats,
}

impl ProviderStats {
    /// Fraction of icon requests answered with a thumbnail
    pub fn thumbnail_rate(&self) -> f64 {
        if self.icon_requests == 0 {
            0.0
        } else {
            self.thumbnails_served as f64 / self.icon_requests as f64
        }
    }
}

/// Icon provider that caches generated thumbnails
///
/// Generic over the backend strategy `B` that produces pixels on the worker
/// and the uploader `U` that turns them into textures on the render thread.
/// All methods must be called from the render thread.
///
/// # Example
///
/// ```no_run
/// use filechooser_cache::ThumbnailConfig;
/// use filechooser_render::PortableBackend;
/// use filechooser_ui::{FileItem, IconProvider, SoftwareUploader, ViewMode};
///
/// let mut provider = IconProvider::new(
///     PortableBackend::new(),
///     SoftwareUploader::new(),
///     ThumbnailConfig::default(),
/// )?
/// .with_view_mode(ViewMode::MediumIcons);
///
/// let item = FileItem::file("/photos/cat.jpg");
/// loop {
///     // Once per frame
///     provider.process_completions();
///     let icon = provider.get_icon(&item);
///     if icon.is_thumbnail() {
///         break;
///     }
/// }
/// # Ok::<(), filechooser_ui::ProviderError>(())
/// ```
pub struct IconProvider<B, U> {
    backend: Arc<B>,
    uploader: U,
    config: ThumbnailConfig,
    fallback: FileTypeIcons,
    cache: ThumbnailCache,
    scheduler: ThumbnailScheduler,
    view_mode: ViewMode,
    failed: HashSet<ThumbnailKey>,
    stats: ProviderStats,
    disposed: bool,
}

impl<B: ThumbnailBackend, U: TextureUploader> IconProvider<B, U> {
    /// Create a provider and start its worker
    ///
    /// # Arguments
    ///
    /// * `backend` - Strategy producing thumbnail pixels
    /// * `uploader` - Render-thread texture factory
    /// * `config` - Cache capacity, source size limit and grid sizes
    pub fn new(backend: B, uploader: U, config: ThumbnailConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let scheduler = ThumbnailScheduler::new()?;

        log::debug!(
            "{} icon provider started (capacity {})",
            backend.name(),
            config.capacity
        );

        Ok(Self {
            backend: Arc::new(backend),
            uploader,
            cache: ThumbnailCache::new(config.capacity),
            config,
            fallback: FileTypeIcons::new(),
            scheduler,
            view_mode: ViewMode::default(),
            failed: HashSet::new(),
            stats: ProviderStats::default(),
            disposed: false,
        })
    }

    /// Start in a view mode without triggering a reset
    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    /// Replace the placeholder icon lookup
    pub fn with_fallback(mut self, fallback: FileTypeIcons) -> Self {
        self.fallback = fallback;
        self
    }

    /// Icon to draw for `item` this frame
    ///
    /// Never blocks. Returns the cached thumbnail for the current tier if
    /// there is one, otherwise the file-type placeholder, queuing generation
    /// the first time a thumbnail is missing.
    pub fn get_icon(&mut self, item: &FileItem) -> Icon {
        self.stats.icon_requests += 1;
        let placeholder = Icon::FileType(self.fallback.icon_for(item));

        let Some(tier) = self.thumbnail_tier(item) else {
            return placeholder;
        };

        let region = self.cache.insert_or_get(&item.source).region(tier);
        if let Some(region) = region {
            self.stats.thumbnails_served += 1;
            return Icon::Thumbnail(region);
        }

        self.schedule(item, tier);
        placeholder
    }

    /// Thumbnail status of `item` in the current view mode
    pub fn state(&self, item: &FileItem) -> ThumbnailState {
        let Some(tier) = self.thumbnail_tier(item) else {
            return ThumbnailState::NotApplicable;
        };

        let ready = self
            .cache
            .lookup(&item.source)
            .is_some_and(|record| record.has_tier(tier));
        if ready {
            return ThumbnailState::Ready;
        }

        let key = ThumbnailKey {
            source: item.source.clone(),
            tier,
        };
        if self.failed.contains(&key) {
            ThumbnailState::Failed
        } else {
            ThumbnailState::Pending
        }
    }

    /// Apply finished jobs; call once per frame
    ///
    /// Returns the sources whose thumbnail became available, so the host
    /// can refresh those items.
    pub fn process_completions(&mut self) -> Vec<PathBuf> {
        if self.disposed {
            return Vec::new();
        }

        let completions = self.scheduler.drain();
        self.apply_all(completions)
    }

    /// Block for up to `timeout` until at least one job finishes, then apply
    ///
    /// For headless hosts without a frame loop.
    pub fn wait_for_completions(&mut self, timeout: Duration) -> Vec<PathBuf> {
        if self.disposed {
            return Vec::new();
        }

        let completions = self.scheduler.wait(timeout);
        self.apply_all(completions)
    }

    /// The chooser navigated to another directory
    ///
    /// # Errors
    ///
    /// `ResourceDisposed` after [`IconProvider::dispose`].
    pub fn on_directory_changed(&mut self, directory: &Path) -> Result<(), ProviderError> {
        log::debug!("directory changed to {}", directory.display());
        self.reset()
    }

    /// The chooser switched view mode
    ///
    /// # Errors
    ///
    /// `ResourceDisposed` after [`IconProvider::dispose`].
    pub fn on_view_mode_changed(&mut self, view_mode: ViewMode) -> Result<(), ProviderError> {
        log::debug!("view mode changed to {:?}", view_mode);
        if self.disposed {
            return Err(ThumbnailError::ResourceDisposed.into());
        }
        self.view_mode = view_mode;
        self.reset()
    }

    /// Change the cache capacity, evicting the oldest records if needed
    ///
    /// Returns the number of records evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.config.capacity = capacity.max(1);
        self.cache.set_capacity(capacity)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Number of generation jobs queued or running
    pub fn pending_jobs(&self) -> usize {
        self.scheduler.pending_len()
    }

    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            cache: self.cache.stats(),
            scheduler: self.scheduler.stats(),
            ..self.stats
        }
    }

    /// Stop generation and release every cached texture
    ///
    /// Afterwards `get_icon` only returns placeholders and the change
    /// callbacks fail with `ResourceDisposed`. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.disposed = true;
        self.scheduler.shutdown();
        self.failed.clear();
        let released = self.cache.clear();
        log::debug!("icon provider disposed, released {} textures", released);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancel outstanding jobs and re-apply the capacity policy
    ///
    /// Cached thumbnails survive; failed files are attempted again.
    fn reset(&mut self) -> Result<(), ProviderError> {
        if self.disposed {
            return Err(ThumbnailError::ResourceDisposed.into());
        }

        self.scheduler.reset()?;
        self.failed.clear();
        let evicted = self.cache.enforce_capacity();
        if evicted > 0 {
            log::debug!("reset evicted {} thumbnail records", evicted);
        }
        Ok(())
    }

    /// Tier to show for `item`, or `None` if it gets no thumbnail
    fn thumbnail_tier(&self, item: &FileItem) -> Option<Tier> {
        if self.disposed || !self.fallback.is_image(item) {
            return None;
        }
        self.view_mode.tier()
    }

    fn schedule(&mut self, item: &FileItem, tier: Tier) {
        let key = ThumbnailKey {
            source: item.source.clone(),
            tier,
        };
        if self.failed.contains(&key) || self.scheduler.is_pending(&key) {
            return;
        }

        let max_source = ImageSize::new(self.config.max_source_width, self.config.max_source_height);
        if let Some(size) = item.native_size {
            if size.exceeds(max_source) {
                log::debug!(
                    "skipping {}: {} exceeds {}",
                    item.source.display(),
                    size,
                    max_source
                );
                self.stats.oversized_skipped += 1;
                self.failed.insert(key);
                return;
            }
        }

        let request = ThumbnailRequest::new(&item.source, self.config.grid.for_tier(tier))
            .with_source_size(item.native_size)
            .with_max_source(max_source);
        let backend = Arc::clone(&self.backend);

        if self
            .scheduler
            .schedule(key, move |token| backend.generate(&request, token))
        {
            self.stats.jobs_scheduled += 1;
        }
    }

    fn apply_all(
        &mut self,
        completions: Vec<Completion<ThumbnailKey, Pixmap, ThumbnailError>>,
    ) -> Vec<PathBuf> {
        completions
            .into_iter()
            .filter_map(|completion| self.apply(completion))
            .collect()
    }

    /// Turn one finished job into a texture on the render thread
    fn apply(
        &mut self,
        completion: Completion<ThumbnailKey, Pixmap, ThumbnailError>,
    ) -> Option<PathBuf> {
        let key = completion.key;

        let pixmap = match completion.outcome {
            JobOutcome::Completed(pixmap) => pixmap,
            JobOutcome::Failed(err) => {
                self.stats.failures += 1;
                if err.is_retryable() {
                    log::debug!(
                        "no thumbnail for {} until the next reset: {}",
                        key.source.display(),
                        err
                    );
                } else {
                    log::warn!("no thumbnail for {}: {}", key.source.display(), err);
                }
                self.failed.insert(key);
                return None;
            }
            JobOutcome::Panicked(message) => {
                self.stats.failures += 1;
                log::error!(
                    "thumbnail job for {} panicked: {}",
                    key.source.display(),
                    message
                );
                self.failed.insert(key);
                return None;
            }
        };

        if !self.cache.contains(&key.source) {
            log::debug!(
                "{} was evicted before its thumbnail finished",
                key.source.display()
            );
            self.stats.released_after_eviction += 1;
            return None;
        }

        let texture = match self.uploader.upload(pixmap) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("texture upload for {} failed: {}", key.source.display(), err);
                self.stats.failures += 1;
                self.failed.insert(key);
                return None;
            }
        };

        let record = self.cache.lookup_mut(&key.source)?;
        if !record.add_tier(key.tier, texture) {
            return None;
        }

        self.stats.textures_uploaded += 1;
        Some(key.source)
    }
}

impl<S: ShellThumbnails, U: TextureUploader> IconProvider<NativeBackend<S>, U> {
    /// Create a provider backed by the OS shell
    ///
    /// # Errors
    ///
    /// `ProviderError::Backend(PlatformUnsupported)` before anything is
    /// scheduled if the shell capability is unavailable.
    pub fn native(shell: S, uploader: U, config: ThumbnailConfig) -> Result<Self, ProviderError> {
        let backend = NativeBackend::new(shell)?;
        Self::new(backend, uploader, config)
    }
}
