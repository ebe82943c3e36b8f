//! Content-addressed urls for reduced artifacts.
//!
//! Stylesheets: `{host}{virtual_path}/{key}-{signature}-{CSS_FILE_NAME}`
//! Sprites:     `{host}{virtual_path}/{key}-{signature}.png`
//!
//! `key` identifies the job (the input fingerprint unless the caller picks
//! one) and `signature` is the hash of the produced bytes. When the bytes
//! change the url changes, so the url itself can be cached forever.

use crate::config::ContentConfig;
use crate::utils::hash::ContentHash;

/// File name every reduced stylesheet url ends with.
pub const CSS_FILE_NAME: &str = "ReducedStyle.css";

/// Builds and decodes artifact urls for one host and virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriBuilder {
    content_host: String,
    virtual_path: String,
}

impl UriBuilder {
    pub fn new(content_host: impl Into<String>, virtual_path: impl Into<String>) -> Self {
        Self {
            content_host: content_host.into(),
            virtual_path: virtual_path.into(),
        }
    }

    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(&config.host, &config.virtual_path)
    }

    /// Stylesheet url signed with the hash of `content`.
    pub fn build_css_url(&self, key: ContentHash, content: &[u8]) -> String {
        self.build_css_url_with_signature(key, &ContentHash::of(content).to_hex())
    }

    /// Stylesheet url with a precomputed signature.
    pub fn build_css_url_with_signature(&self, key: ContentHash, signature: &str) -> String {
        format!(
            "{}{}/{}-{}-{}",
            self.content_host,
            self.virtual_path,
            key.to_hex(),
            signature,
            CSS_FILE_NAME
        )
    }

    /// Sprite sheet url signed with the hash of the encoded sheet.
    pub fn build_sprite_url(&self, key: ContentHash, content: &[u8]) -> String {
        format!(
            "{}{}/{}-{}.png",
            self.content_host,
            self.virtual_path,
            key.to_hex(),
            ContentHash::of(content).to_hex()
        )
    }

    /// Last path segment of `url`.
    pub fn parse_file_name(url: &str) -> &str {
        url.rfind('/').map_or(url, |idx| &url[idx + 1..])
    }

    /// Key of an artifact url; the empty hash when `url` has no key.
    pub fn parse_key(url: &str) -> ContentHash {
        Self::parse_file_name(url)
            .split_once('-')
            .and_then(|(key, _)| ContentHash::from_hex(key))
            .unwrap_or_else(ContentHash::empty)
    }

    /// Signature of an artifact url as 32 hex characters; all zeros when
    /// `url` has no signature.
    pub fn parse_signature(url: &str) -> String {
        let start = ContentHash::HEX_LEN + 1;
        Self::parse_file_name(url)
            .get(start..start + ContentHash::HEX_LEN)
            .and_then(ContentHash::from_hex)
            .unwrap_or_else(ContentHash::empty)
            .to_hex()
    }
}
