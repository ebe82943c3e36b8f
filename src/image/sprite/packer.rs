//! Per-job sprite packing.
//!
//! [`SpritePacker`] collects images; [`SpritePacker::flush`] consumes it and
//! yields [`PackedSprites`], the only type that can answer placements.

use rustc_hash::FxHashMap;

use super::SpritePlacement;
use super::sheet::SpriteSheet;
use crate::asset::{Fetch, Store, UriBuilder};
use crate::css::BackgroundDeclaration;
use crate::error::Result;
use crate::utils::hash::ContentHash;
use crate::{debug, log};

/// Where an image went before its sheet had a url.
#[derive(Debug, Clone, Copy)]
struct PendingPlacement {
    sheet: usize,
    x: u32,
}

/// Collecting state: images accumulate into size-bounded sheets.
pub struct SpritePacker<'a> {
    key: ContentHash,
    size_limit: usize,
    uri_builder: &'a UriBuilder,
    store: &'a dyn Store,
    fetcher: &'a dyn Fetch,
    open: SpriteSheet,
    sealed: Vec<Vec<u8>>,
    placements: FxHashMap<String, PendingPlacement>,
}

impl<'a> SpritePacker<'a> {
    pub fn new(
        key: ContentHash,
        size_limit: usize,
        uri_builder: &'a UriBuilder,
        store: &'a dyn Store,
        fetcher: &'a dyn Fetch,
    ) -> Self {
        Self {
            key,
            size_limit,
            uri_builder,
            store,
            fetcher,
            open: SpriteSheet::new(),
            sealed: Vec::new(),
            placements: FxHashMap::default(),
        }
    }

    /// Fetch and place the declaration's image.
    ///
    /// An image already placed in this job is not packed twice. Bytes that do
    /// not decode are skipped; fetch failures propagate.
    pub fn add_image(&mut self, decl: &BackgroundDeclaration) -> Result<()> {
        let url = decl.image_url();
        if self.placements.contains_key(url) {
            return Ok(());
        }

        let bytes = self.fetcher.download_bytes(url)?;
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                log!("sprite"; "skipping {}: {}", url, e);
                return Ok(());
            }
        };

        if !self.open.is_empty() && self.open.would_overflow(bytes.len(), self.size_limit) {
            self.seal_open()?;
        }

        let x = self.open.push(image, bytes.len());
        self.placements.insert(
            url.to_string(),
            PendingPlacement {
                sheet: self.sealed.len(),
                x,
            },
        );
        Ok(())
    }

    fn seal_open(&mut self) -> Result<()> {
        let sheet = std::mem::take(&mut self.open);
        let size = sheet.estimated_size();
        let png = sheet.seal()?;
        debug!("sprite"; "sealed sheet {} (~{} source bytes, {} png bytes)", self.sealed.len(), size, png.len());
        self.sealed.push(png);
        Ok(())
    }

    /// Seal the open sheet, persist every sheet and expose placements.
    pub fn flush(mut self) -> Result<PackedSprites> {
        if !self.open.is_empty() {
            self.seal_open()?;
        }

        let mut sheet_urls = Vec::with_capacity(self.sealed.len());
        for png in &self.sealed {
            let url = self.uri_builder.build_sprite_url(self.key, png);
            self.store.save(png, &url, &self.key.to_hex())?;
            sheet_urls.push(url);
        }

        let placements = self
            .placements
            .into_iter()
            .map(|(image, pending)| {
                let placement = SpritePlacement::new(&sheet_urls[pending.sheet], pending.x, 0);
                (image, placement)
            })
            .collect();

        Ok(PackedSprites {
            sheet_urls,
            placements,
        })
    }
}

/// Flushed state: every sheet is persisted and placements are final.
#[derive(Debug)]
pub struct PackedSprites {
    sheet_urls: Vec<String>,
    placements: FxHashMap<String, SpritePlacement>,
}

impl PackedSprites {
    /// Placement of the declaration's image, if it was packed.
    pub fn placement_of(&self, decl: &BackgroundDeclaration) -> Option<&SpritePlacement> {
        self.placements.get(decl.image_url())
    }

    /// Urls of the persisted sheets, in sealing order.
    pub fn sheet_urls(&self) -> &[String] {
        &self.sheet_urls
    }
}
