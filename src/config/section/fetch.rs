//! `[fetch]` section configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Remote stylesheet and image retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
