//! External conversion engine invocation.
//!
//! The engine is an opaque executable that reads a drawing from one local
//! path and writes a model to another. [`subprocess::run_engine`] runs it
//! once, races it against the configured budget, and captures its output.

pub mod executor;
pub mod subprocess;

pub use executor::{
    CompletionMode, EngineCommand, EngineError, EngineExecutionResult, DEFAULT_ENGINE_TIMEOUT,
};
pub use subprocess::run_engine;
