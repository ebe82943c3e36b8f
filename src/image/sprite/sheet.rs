use std::io::Cursor;

use image::{ImageFormat, RgbaImage, imageops};

use crate::error::Result;

/// One open sheet: decoded images laid left to right in insertion order.
#[derive(Debug, Default)]
pub struct SpriteSheet {
    images: Vec<RgbaImage>,
    width: u32,
    height: u32,
    /// Sum of the source images' encoded byte lengths.
    estimated_size: usize,
}

impl SpriteSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Whether adding `encoded_len` more bytes would exceed `limit`.
    pub fn would_overflow(&self, encoded_len: usize, limit: usize) -> bool {
        self.estimated_size + encoded_len > limit
    }

    /// Append `image`, returning its x offset in the sheet.
    pub fn push(&mut self, image: RgbaImage, encoded_len: usize) -> u32 {
        let x = self.width;
        self.width += image.width();
        self.height = self.height.max(image.height());
        self.estimated_size += encoded_len;
        self.images.push(image);
        x
    }

    pub fn estimated_size(&self) -> usize {
        self.estimated_size
    }

    /// Compose the images into one raster and encode it as PNG.
    ///
    /// Consumes the sheet; the per-image buffers are dropped once composed.
    pub fn seal(self) -> Result<Vec<u8>> {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let mut x = 0;
        for image in &self.images {
            imageops::replace(&mut canvas, image, i64::from(x), 0);
            x += image.width();
        }
        drop(self.images);

        let mut png = Cursor::new(Vec::new());
        canvas.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}
