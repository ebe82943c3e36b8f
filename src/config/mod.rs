//! Configuration for `reduce.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[content]` | Output url host and path, store backend        |
//! | `[sprite]`  | Sprite sheet size limit                        |
//! | `[fetch]`   | Timeout for stylesheet and image downloads     |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{ContentConfig, FetchConfig, SpriteConfig, StoreKind};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::asset::{LocalDiskStore, MemoryStore, Store};
use crate::{debug, log};

/// Default config file name.
pub const CONFIG_FILE: &str = "reduce.toml";

/// Root configuration structure representing reduce.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    pub content: ContentConfig,
    pub sprite: SpriteConfig,
    pub fetch: FetchConfig,
}

impl ReduceConfig {
    /// Load and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Self::from_path(path)?
        } else {
            debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Check values serde cannot: the store kind and its requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.content.store_kind()?;
        if kind == StoreKind::LocalDisk && self.content.physical_path.is_none() {
            return Err(ConfigError::Validation(
                "local-disk store requires content.physical_path".into(),
            ));
        }
        Ok(())
    }

    /// Build the configured store, creating its directory if needed.
    pub fn open_store(&self) -> Result<Arc<dyn Store>> {
        match self.content.store_kind()? {
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreKind::LocalDisk => {
                let path = self.content.physical_path.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "local-disk store requires content.physical_path".into(),
                    )
                })?;
                fs::create_dir_all(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Ok(Arc::new(LocalDiskStore::new(path)))
            }
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

#[cfg(test)]
pub fn test_parse_config(content: &str) -> ReduceConfig {
    let (parsed, ignored) = ReduceConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
