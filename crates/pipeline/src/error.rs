use std::path::PathBuf;
use std::time::Duration;

/// User-visible error text when the engine exceeds its budget.
pub const TIMEOUT_ERROR_TEXT: &str = "processing timeout";

/// User-visible error text when the engine exits 0 without writing output.
pub const ARTIFACT_MISSING_ERROR_TEXT: &str = "artifact not generated";

/// Fatal pipeline failures. Each one halts the job; cleanup still runs.
///
/// Metadata failures are deliberately absent: they are handled inside the
/// recorder and never reach the reporter.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("staging failed: {0}")]
    Staging(String),

    #[error("engine failed (exit code {exit_code:?}): {stderr}")]
    Engine {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("engine exceeded its {budget:?} budget")]
    EngineTimeout { budget: Duration },

    #[error("engine exited successfully but did not write {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("upload to bucket '{bucket}' failed: {reason}")]
    Publish { bucket: String, reason: String },
}

impl PipelineError {
    /// The flat `error` string reported to the caller.
    pub fn error_text(&self) -> String {
        match self {
            Self::Staging(reason) => reason.clone(),
            Self::Engine { exit_code, stderr } => {
                let stderr = stderr.trim_end();
                if !stderr.trim().is_empty() {
                    stderr.to_string()
                } else if let Some(code) = exit_code {
                    format!("engine exited with status {code}")
                } else {
                    "engine terminated without an exit status".to_string()
                }
            }
            Self::EngineTimeout { .. } => TIMEOUT_ERROR_TEXT.to_string(),
            Self::ArtifactMissing { .. } => ARTIFACT_MISSING_ERROR_TEXT.to_string(),
            Self::Publish { reason, .. } => reason.clone(),
        }
    }

    /// Short stage name for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Staging(_) => "staging",
            Self::Engine { .. } | Self::EngineTimeout { .. } => "engine",
            Self::ArtifactMissing { .. } | Self::Publish { .. } => "publish",
        }
    }
}
