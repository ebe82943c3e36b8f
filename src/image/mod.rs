//! Image processing.
//!
//! - [`sprite`]: packing background images into sprite sheets

pub mod sprite;
