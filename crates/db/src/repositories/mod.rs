//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod conversion_repo;

pub use conversion_repo::ConversionRepo;
