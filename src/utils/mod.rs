//! Utility modules shared by the reducer.

pub mod hash;
