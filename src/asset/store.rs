//! Where reduced artifacts live once built.
//!
//! A store is addressed by artifact url; each backend decides how a url maps
//! to its own storage.

use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use dashmap::DashMap;

use super::url::UriBuilder;
use crate::error::{ReduceError, Result};
use crate::log;

/// Persists artifacts and serves them back by url.
pub trait Store: Send + Sync {
    /// Persist `content` under `url`. `source` records what it was built from.
    fn save(&self, content: &[u8], url: &str, source: &str) -> Result<()>;

    /// Full content stored under `url`.
    fn get(&self, url: &str) -> Option<Vec<u8>>;

    /// Readable stream over the content stored under `url`.
    fn open_stream(&self, url: &str) -> Option<Box<dyn Read + Send>>;
}

// ============================================================================
// Local disk
// ============================================================================

/// Files under one directory, named by the url's last segment.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    physical_path: PathBuf,
}

impl LocalDiskStore {
    pub fn new(physical_path: impl Into<PathBuf>) -> Self {
        Self {
            physical_path: physical_path.into(),
        }
    }

    fn file_for(&self, url: &str) -> PathBuf {
        self.physical_path.join(UriBuilder::parse_file_name(url))
    }
}

impl Store for LocalDiskStore {
    fn save(&self, content: &[u8], url: &str, source: &str) -> Result<()> {
        let path = self.file_for(url);
        fs::create_dir_all(&self.physical_path).map_err(|e| ReduceError::store(url, e))?;
        fs::write(&path, content).map_err(|e| ReduceError::store(url, e))?;
        log!("store"; "{} ({} bytes) from {}", path.display(), content.len(), source);
        Ok(())
    }

    fn get(&self, url: &str) -> Option<Vec<u8>> {
        fs::read(self.file_for(url)).ok()
    }

    fn open_stream(&self, url: &str) -> Option<Box<dyn Read + Send>> {
        let file = fs::File::open(self.file_for(url)).ok()?;
        Some(Box::new(file))
    }
}

// ============================================================================
// Memory
// ============================================================================

#[derive(Debug, Clone)]
struct StoredArtifact {
    content: Vec<u8>,
    source: String,
}

/// In-process store keyed by full url.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: DashMap<String, StoredArtifact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the artifact at `url` was built from.
    pub fn source_of(&self, url: &str) -> Option<String> {
        self.artifacts.get(url).map(|a| a.source.clone())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Store for MemoryStore {
    fn save(&self, content: &[u8], url: &str, source: &str) -> Result<()> {
        self.artifacts.insert(
            url.to_string(),
            StoredArtifact {
                content: content.to_vec(),
                source: source.to_string(),
            },
        );
        Ok(())
    }

    fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.artifacts.get(url).map(|a| a.content.clone())
    }

    fn open_stream(&self, url: &str) -> Option<Box<dyn Read + Send>> {
        let content = self.get(url)?;
        Some(Box::new(Cursor::new(content)))
    }
}
