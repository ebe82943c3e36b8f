//! Inspect command implementation.

use owo_colors::OwoColorize;

use crate::asset::UriBuilder;

/// Decoded parts of a reduced url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub key: String,
    pub signature: String,
    pub file_name: String,
}

impl UrlParts {
    pub fn parse(url: &str) -> Self {
        Self {
            key: UriBuilder::parse_key(url).to_hex(),
            signature: UriBuilder::parse_signature(url),
            file_name: UriBuilder::parse_file_name(url).to_string(),
        }
    }
}

pub fn inspect_url(url: &str) {
    let parts = UrlParts::parse(url);
    println!("{:>10} {}", "key".cyan(), parts.key);
    println!("{:>10} {}", "signature".cyan(), parts.signature);
    println!("{:>10} {}", "file".cyan(), parts.file_name);
}
