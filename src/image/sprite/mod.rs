//! Sprite sheets: background images composed into shared rasters.

mod packer;
mod sheet;


pub use packer::{PackedSprites, SpritePacker};
pub use sheet::SpriteSheet;

/// Default upper bound on a sheet's estimated size, in bytes.
pub const DEFAULT_SIZE_LIMIT: usize = 50_000;

/// Where an image landed: the sheet url and its pixel offset inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpritePlacement {
    pub url: String,
    pub x: u32,
    pub y: u32,
}

impl SpritePlacement {
    pub fn new(url: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            url: url.into(),
            x,
            y,
        }
    }
}
