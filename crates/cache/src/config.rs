//! Thumbnail configuration
//!
//! Centralizes the knobs of the thumbnail subsystem: cache capacity, the
//! largest source image worth decoding, and the grid size of each icon view.
//! Configuration can be loaded from a TOML file, environment variables, or
//! created programmatically.

use crate::record::Tier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Grid cell size in pixels for each thumbnail view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSizes {
    pub small: u32,
    pub medium: u32,
    pub big: u32,
}

impl Default for GridSizes {
    fn default() -> Self {
        Self {
            small: 64,
            medium: 128,
            big: 256,
        }
    }
}

impl GridSizes {
    /// Target pixel size for thumbnails of `tier`
    pub fn for_tier(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.big,
        }
    }
}

/// Configuration for thumbnail caching and generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Maximum number of cached thumbnail records
    pub capacity: usize,

    /// Sources wider than this are never decoded
    pub max_source_width: u32,

    /// Sources taller than this are never decoded
    pub max_source_height: u32,

    /// Grid sizes of the icon view modes
    pub grid: GridSizes,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            capacity: 600,
            max_source_width: 4096,
            max_source_height: 4096,
            grid: GridSizes::default(),
        }
    }
}

const ENV_CAPACITY: &str = "FILECHOOSER_THUMB_CAPACITY";
const ENV_MAX_SOURCE: &str = "FILECHOOSER_THUMB_MAX_SOURCE";
const ENV_GRID: &str = "FILECHOOSER_THUMB_GRID";

impl ThumbnailConfig {
    /// Sets the cache capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the largest source dimensions accepted for decoding.
    pub fn with_max_source(mut self, width: u32, height: u32) -> Self {
        self.max_source_width = width;
        self.max_source_height = height;
        self
    }

    /// Sets the view mode grid sizes.
    pub fn with_grid(mut self, grid: GridSizes) -> Self {
        self.grid = grid;
        self
    }

    /// Returns the default configuration file location.
    ///
    /// - macOS: ~/Library/Application Support/filechooser/thumbnails.toml
    /// - Linux: ~/.config/filechooser/thumbnails.toml
    /// - Windows: %APPDATA%\filechooser\thumbnails.toml
    pub fn default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("filechooser").join("thumbnails.toml")
        } else {
            PathBuf::from("thumbnails.toml")
        }
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `FILECHOOSER_THUMB_CAPACITY`: cached record count (default: 600)
    /// - `FILECHOOSER_THUMB_MAX_SOURCE`: largest accepted source side (default: 4096)
    /// - `FILECHOOSER_THUMB_GRID`: `small,medium,big` grid sizes (default: 64,128,256)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Applies environment overrides to an existing configuration.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var(ENV_CAPACITY) {
            self.capacity = parse_value(ENV_CAPACITY, &val)?;
        }

        if let Ok(val) = std::env::var(ENV_MAX_SOURCE) {
            let side = parse_value(ENV_MAX_SOURCE, &val)?;
            self.max_source_width = side;
            self.max_source_height = side;
        }

        if let Ok(val) = std::env::var(ENV_GRID) {
            let sizes = val
                .split(',')
                .map(|part| parse_value::<u32>(ENV_GRID, part))
                .collect::<Result<Vec<_>, _>>()?;
            match sizes.as_slice() {
                [small, medium, big] => {
                    self.grid = GridSizes {
                        small: *small,
                        medium: *medium,
                        big: *big,
                    };
                }
                _ => return Err(ConfigError::InvalidValue(ENV_GRID.to_string())),
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// capacity = 600
    /// max_source_width = 4096
    /// max_source_height = 4096
    ///
    /// [grid]
    /// small = 64
    /// medium = 128
    /// big = 256
    /// ```
    ///
    /// Missing keys keep their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path.as_ref(), toml)?;
        Ok(())
    }

    /// Rejects values that would make the subsystem unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidValue("capacity".to_string()));
        }
        if self.max_source_width == 0 || self.max_source_height == 0 {
            return Err(ConfigError::InvalidValue("max_source".to_string()));
        }
        if self.grid.small == 0 || self.grid.medium == 0 || self.grid.big == 0 {
            return Err(ConfigError::InvalidValue("grid".to_string()));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    /// I/O error reading or writing the configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
