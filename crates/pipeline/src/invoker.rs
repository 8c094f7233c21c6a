//! Run the external engine against a job's staged paths.

use cad3d_core::engine::{self, CompletionMode, EngineCommand, EngineExecutionResult};
use cad3d_core::job::Job;

use crate::cleanup::StagingWorkspace;
use crate::error::PipelineError;

/// Invokes the engine exactly once per job. No retries.
#[derive(Debug, Clone)]
pub struct EngineInvoker {
    command: EngineCommand,
}

impl EngineInvoker {
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }

    /// Run the engine and classify its result.
    ///
    /// Success means exit status zero within budget; whether the output
    /// file exists is the publisher's concern.
    pub async fn invoke(
        &self,
        job: &Job,
        workspace: &StagingWorkspace,
    ) -> Result<EngineExecutionResult, PipelineError> {
        tracing::info!(
            program = %self.command.program.display(),
            budget_secs = self.command.timeout.as_secs_f64(),
            "Invoking engine",
        );

        let result = engine::run_engine(
            &self.command,
            &workspace.input().path,
            workspace.output_path(),
            &job.prompt,
        )
        .await
        .map_err(|e| PipelineError::Engine {
            exit_code: None,
            stderr: e.to_string(),
        })?;

        let elapsed_ms = result.elapsed.as_millis() as u64;

        if let CompletionMode::TimedOut { reaped } = result.mode {
            if !reaped {
                tracing::error!(elapsed_ms, "Engine killed on timeout but not yet reaped");
            }
            tracing::warn!(elapsed_ms, "Engine exceeded its budget");
            return Err(PipelineError::EngineTimeout {
                budget: self.command.timeout,
            });
        }

        if !result.stdout.is_empty() {
            tracing::debug!(stdout = %result.stdout.trim_end(), "Engine stdout");
        }

        if !result.succeeded() {
            tracing::warn!(exit_code = ?result.exit_code, elapsed_ms, "Engine failed");
            return Err(PipelineError::Engine {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        tracing::info!(elapsed_ms, "Engine completed");
        Ok(result)
    }
}
