//! css-reduce: merge the stylesheets of a page into one minified,
//! content-addressed artifact, moving background images into sprite sheets.
//!
//! # Modules
//!
//! - [`css`]: background declaration parsing, extraction and rewriting
//! - [`image`]: sprite sheet packing
//! - [`asset`]: fetch, minify and store capabilities, artifact urls
//! - [`cache`]: fingerprint to reduced-url repository
//! - [`reducer`]: the reduction job and its background queue
//! - [`config`]: `reduce.toml`
//! - [`cli`]: the `css-reduce` binary's commands

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod css;
pub mod error;
pub mod image;
pub mod logger;
pub mod reducer;
pub mod utils;

pub use error::{ReduceError, Result};
