//! Per-file thumbnail records
//!
//! A record is created on the first cache miss for a file and gains one
//! texture per display tier as generation jobs complete.

use crate::texture::{GpuTexture, TextureRegion};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Display-density bucket a thumbnail is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Small icons view
    Small,
    /// Medium icons view
    Medium,
    /// Big icons view
    Large,
}

impl Tier {
    /// All tiers, smallest first
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Medium, Tier::Large];

    /// Slot index of this tier inside a record
    pub fn index(self) -> usize {
        match self {
            Tier::Small => 0,
            Tier::Medium => 1,
            Tier::Large => 2,
        }
    }
}

/// Unique identifier for a record instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
struct TierSlot {
    texture: Option<GpuTexture>,
    region: Option<TextureRegion>,
}

/// Cached thumbnails for a single source file
#[derive(Debug)]
pub struct ThumbnailRecord {
    id: RecordId,
    source: PathBuf,
    tiers: [TierSlot; 3],
}

impl ThumbnailRecord {
    /// Create an empty record for `source`
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            id: RecordId::next(),
            source: source.into(),
            tiers: Default::default(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Path of the file this record belongs to
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Drawable for `tier`, if that tier has been generated
    pub fn region(&self, tier: Tier) -> Option<TextureRegion> {
        self.tiers[tier.index()].region
    }

    /// Texture for `tier`, if that tier has been generated
    pub fn texture(&self, tier: Tier) -> Option<&GpuTexture> {
        self.tiers[tier.index()].texture.as_ref()
    }

    pub fn has_tier(&self, tier: Tier) -> bool {
        self.tiers[tier.index()].texture.is_some()
    }

    /// Number of tiers that currently hold a texture
    pub fn tier_count(&self) -> usize {
        self.tiers.iter().filter(|slot| slot.texture.is_some()).count()
    }

    /// Store the texture generated for `tier`
    ///
    /// A tier is populated at most once. If it already holds a texture the
    /// new one is released immediately and `false` is returned.
    pub fn add_tier(&mut self, tier: Tier, texture: GpuTexture) -> bool {
        let slot = &mut self.tiers[tier.index()];
        if slot.texture.is_some() {
            log::debug!(
                "{}: {:?} tier already populated, releasing duplicate texture",
                self.source.display(),
                tier
            );
            return false;
        }

        slot.region = Some(texture.region());
        slot.texture = Some(texture);
        true
    }

    /// Release every texture held by this record
    ///
    /// Returns the number of textures released. Must run on the render thread.
    pub fn dispose(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.tiers {
            slot.region = None;
            if slot.texture.take().is_some() {
                released += 1;
            }
        }
        released
    }
}
