//! Caches shared between callers and the reduction worker.

pub mod repository;

pub use repository::ReductionRepository;
