//! Capabilities the reducer depends on.
//!
//! Each is a trait so the engine can be driven by test doubles; the
//! production implementations sit next to them.

pub mod fetch;
pub mod minify;
pub mod store;
pub mod url;

pub use fetch::{Fetch, HttpFetcher};
pub use minify::{CssMinifier, Minify};
pub use store::{LocalDiskStore, MemoryStore, Store};
pub use url::{CSS_FILE_NAME, UriBuilder};
