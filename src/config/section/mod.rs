//! Configuration sections of `reduce.toml`.

mod content;
mod fetch;
mod sprite;

pub use content::{ContentConfig, StoreKind};
pub use fetch::FetchConfig;
pub use sprite::SpriteConfig;
