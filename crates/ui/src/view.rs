//! File chooser view modes

use filechooser_cache::{GridSizes, Tier};

/// How the file chooser lays out its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Table with name, size and date columns
    #[default]
    Details,
    /// Single column of names
    List,
    SmallIcons,
    MediumIcons,
    BigIcons,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Details,
        ViewMode::List,
        ViewMode::SmallIcons,
        ViewMode::MediumIcons,
        ViewMode::BigIcons,
    ];

    /// Whether items in this mode show image thumbnails
    pub fn is_thumbnail_mode(&self) -> bool {
        self.tier().is_some()
    }

    /// Thumbnail tier used by this mode
    pub fn tier(&self) -> Option<Tier> {
        match self {
            ViewMode::SmallIcons => Some(Tier::Small),
            ViewMode::MediumIcons => Some(Tier::Medium),
            ViewMode::BigIcons => Some(Tier::Large),
            ViewMode::Details | ViewMode::List => None,
        }
    }

    /// Edge length of a grid cell, which is also the thumbnail target size
    pub fn grid_size(&self, sizes: &GridSizes) -> Option<u32> {
        self.tier().map(|tier| sizes.for_tier(tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_modes() {
        let thumbnail_modes: Vec<ViewMode> = ViewMode::ALL
            .into_iter()
            .filter(ViewMode::is_thumbnail_mode)
            .collect();

        assert_eq!(
            thumbnail_modes,
            vec![
                ViewMode::SmallIcons,
                ViewMode::MediumIcons,
                ViewMode::BigIcons
            ]
        );
        assert_eq!(ViewMode::default(), ViewMode::Details);
    }

    #[test]
    fn test_grid_size_per_tier() {
        let sizes = GridSizes::default();

        assert_eq!(ViewMode::Details.grid_size(&sizes), None);
        assert_eq!(ViewMode::List.tier(), None);
        assert_eq!(
            ViewMode::SmallIcons.grid_size(&sizes),
            Some(sizes.for_tier(Tier::Small))
        );
        assert_eq!(ViewMode::BigIcons.tier(), Some(Tier::Large));
        assert!(
            ViewMode::SmallIcons.grid_size(&sizes) < ViewMode::BigIcons.grid_size(&sizes)
        );
    }
}
