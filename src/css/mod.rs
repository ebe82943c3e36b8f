//! Stylesheet background handling.
//!
//! - [`declaration`]: one rule's background properties, parse and render
//! - [`position`]: tagged offsets and axis disambiguation
//! - [`extract`]: locate background rules in a stylesheet, splice rewrites back by offset

pub mod declaration;
pub mod extract;
pub mod position;


pub use declaration::{BackgroundDeclaration, ParseError, Repeat};
pub use extract::{extract_images, inject_sprites};
pub use position::{Direction, Offset, Position};
