//! Command-line interface module.

mod args;
pub mod inspect;
pub mod reduce;

pub use args::{Cli, Commands, ReduceArgs};
