//! Domain types and collaborator traits for the drawing-to-CAD conversion
//! service.
//!
//! Everything here is free of HTTP and database concerns so the pipeline,
//! the API server and the CLI share one vocabulary.

pub mod artifact;
pub mod engine;
pub mod error;
pub mod job;
pub mod metadata;
pub mod outcome;
pub mod storage;
pub mod types;
