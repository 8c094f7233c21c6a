//! Conversion job orchestration.
//!
//! One job is one strictly sequential pipeline:
//!
//! ```text
//! stage -> invoke (raced against budget) -> publish input -> publish output
//!       -> record metadata (best-effort) -> cleanup -> report
//! ```
//!
//! A fatal failure at any stage skips straight to cleanup and reporting.

pub mod cleanup;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod publisher;
pub mod recorder;
pub mod reporter;
pub mod stager;

pub use error::PipelineError;
pub use orchestrator::{ConversionRequest, JobHandle, Orchestrator, OrchestratorConfig};
