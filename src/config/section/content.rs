//! `[content]` section configuration.
//!
//! Where reduced artifacts are addressed and stored.
//!
//! # Example
//!
//! ```toml
//! [content]
//! host = "http://cdn.example.com"  # Prepended to every output url
//! virtual_path = "/reduced"        # Url path of the artifacts
//! physical_path = "./reduced"      # Directory for the local-disk store
//! store = "local-disk"             # "local-disk" or "memory"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Artifact addressing and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Scheme and authority prepended to every output url. Empty keeps
    /// urls host-relative.
    pub host: String,

    /// Url path prefix of the artifacts.
    pub virtual_path: String,

    /// Directory the local-disk store writes into.
    pub physical_path: Option<PathBuf>,

    /// Store backend, see [`StoreKind`].
    pub store: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            virtual_path: "/reduced".into(),
            physical_path: Some(PathBuf::from("./reduced")),
            store: StoreKind::LocalDisk.to_string(),
        }
    }
}

impl ContentConfig {
    pub fn store_kind(&self) -> Result<StoreKind, ConfigError> {
        self.store.parse()
    }
}

/// Where artifacts are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    LocalDisk,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local-disk" | "localdisk" => Ok(Self::LocalDisk),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Validation(format!(
                "{s} is not a valid content store"
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalDisk => "local-disk",
            Self::Memory => "memory",
        })
    }
}
