//! Fingerprint → reduced url index.

use dashmap::DashMap;

use crate::utils::hash::ContentHash;

/// Which input sets have already been reduced, and where the result lives.
///
/// Readers on any thread see either no entry or a complete one. The queue
/// worker is the only writer.
#[derive(Debug, Default)]
pub struct ReductionRepository {
    entries: DashMap<ContentHash, String>,
}

impl ReductionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduced url for `fingerprint`, if one exists.
    pub fn find(&self, fingerprint: ContentHash) -> Option<String> {
        self.entries.get(&fingerprint).map(|url| url.clone())
    }

    pub fn add(&self, fingerprint: ContentHash, url: impl Into<String>) {
        self.entries.insert(fingerprint, url.into());
    }

    pub fn contains(&self, fingerprint: ContentHash) -> bool {
        self.entries.contains_key(&fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
