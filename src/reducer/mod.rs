//! Reduction pipeline.
//!
//! - [`process`]: the synchronous job, fetch to persisted url
//! - [`queue`]: the background worker feeding jobs through it

pub mod process;
pub mod queue;

#[cfg(test)]
mod tests;

pub use process::{Reduce, Reducer, URL_SEPARATOR, split_urls};
pub use queue::{ErrorHandler, ReducingQueue};
