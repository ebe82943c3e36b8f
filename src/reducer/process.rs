//! One reduction job, start to finish.

use std::sync::Arc;

use crate::asset::{Fetch, Minify, Store, UriBuilder};
use crate::css::{extract_images, inject_sprites};
use crate::error::Result;
use crate::image::sprite::SpritePacker;
use crate::utils::hash::ContentHash;
use crate::{debug, log};

/// Separator between stylesheet urls in a job's input list.
pub const URL_SEPARATOR: &str = "::";

/// Something that turns an input list into a reduced stylesheet url.
///
/// The queue drives jobs through this seam.
pub trait Reduce: Send + Sync {
    fn reduce(&self, key: ContentHash, urls: &str) -> Result<String>;
}

/// Non-empty urls of a `::`-delimited list, in order.
pub fn split_urls(urls: &str) -> impl Iterator<Item = &str> {
    urls.split(URL_SEPARATOR)
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Fetch, sprite, rewrite, minify and persist a set of stylesheets.
pub struct Reducer {
    fetcher: Arc<dyn Fetch>,
    minifier: Arc<dyn Minify>,
    store: Arc<dyn Store>,
    uri_builder: UriBuilder,
    size_limit: usize,
}

impl Reducer {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        minifier: Arc<dyn Minify>,
        store: Arc<dyn Store>,
        uri_builder: UriBuilder,
        size_limit: usize,
    ) -> Self {
        Self {
            fetcher,
            minifier,
            store,
            uri_builder,
            size_limit,
        }
    }

    /// Reduce `urls`, naming the result after the input fingerprint.
    pub fn process(&self, urls: &str) -> Result<String> {
        self.process_with_key(ContentHash::of(urls), urls)
    }

    /// Reduce `urls`, naming the result after `key`.
    pub fn process_with_key(&self, key: ContentHash, urls: &str) -> Result<String> {
        debug!("reduce"; "{} <- {}", key.to_hex(), urls);

        let mut sheets = Vec::new();
        for url in split_urls(urls) {
            let text = self.fetcher.download_text(url)?;
            let declarations = extract_images(&text, url);
            sheets.push((text, declarations));
        }

        let mut packer = SpritePacker::new(
            key,
            self.size_limit,
            &self.uri_builder,
            self.store.as_ref(),
            self.fetcher.as_ref(),
        );
        for decl in sheets.iter().flat_map(|(_, declarations)| declarations) {
            packer.add_image(decl)?;
        }
        let sprites = packer.flush()?;

        // Each sheet is rewritten on its own text; offsets are per sheet.
        let mut css = String::new();
        let mut rewritten = 0;
        for (text, declarations) in &sheets {
            let placed: Vec<_> = declarations
                .iter()
                .filter_map(|decl| sprites.placement_of(decl).map(|placement| (decl, placement)))
                .collect();
            rewritten += placed.len();
            css.push_str(&inject_sprites(text, placed));
        }

        let minified = self.minifier.minify(&css);
        let signature = ContentHash::of(&minified);
        let url = self
            .uri_builder
            .build_css_url_with_signature(key, &signature.to_hex());
        self.store.save(minified.as_bytes(), &url, urls)?;

        log!(
            "reduce";
            "{} ({} rules into {} sheets)",
            url,
            rewritten,
            sprites.sheet_urls().len()
        );
        Ok(url)
    }
}

impl Reduce for Reducer {
    fn reduce(&self, key: ContentHash, urls: &str) -> Result<String> {
        self.process_with_key(key, urls)
    }
}
