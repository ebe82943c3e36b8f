//! `[sprite]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sprite]
//! size_limit = 50000   # Max estimated bytes per sheet (0 = default)
//! ```

use serde::{Deserialize, Serialize};

use crate::image::sprite::DEFAULT_SIZE_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Upper bound on a sheet's estimated size. The estimate is the sum of
    /// the encoded sizes of the images it holds.
    pub size_limit: usize,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

impl SpriteConfig {
    /// Effective limit; zero falls back to the default.
    pub fn size_limit(&self) -> usize {
        match self.size_limit {
            0 => DEFAULT_SIZE_LIMIT,
            n => n,
        }
    }
}
