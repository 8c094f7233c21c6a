//! Engine command description, execution result and errors.

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock budget for one engine invocation.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

/// How to launch the engine.
///
/// The final command line is
/// `<program> <args...> <input-path> <output-path> --prompt <prompt>`.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    /// Engine executable (or interpreter, with the script in `args`).
    pub program: PathBuf,
    /// Arguments placed before the staged paths.
    pub args: Vec<String>,
    /// Maximum wall-clock time before the process group is killed.
    pub timeout: Duration,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }
}

/// Which of the two raced events resolved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// The process exited on its own.
    Completed,
    /// The budget elapsed first. `reaped` is false if the killed process
    /// had not been collected when the grace period ran out.
    TimedOut { reaped: bool },
}

/// Outcome of one engine invocation.
#[derive(Debug, Clone)]
pub struct EngineExecutionResult {
    /// Exit code, `None` if the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub mode: CompletionMode,
}

impl EngineExecutionResult {
    /// The engine completed within budget with exit status zero.
    pub fn succeeded(&self) -> bool {
        self.mode == CompletionMode::Completed && self.exit_code == Some(0)
    }
}

/// Failures to run the engine at all (as opposed to the engine failing).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for engine: {0}")]
    Wait(#[source] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: Option<i32>, mode: CompletionMode) -> EngineExecutionResult {
        EngineExecutionResult {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::from_millis(10),
            mode,
        }
    }

    #[test]
    fn success_requires_completion_and_zero_exit() {
        assert!(result(Some(0), CompletionMode::Completed).succeeded());
        assert!(!result(Some(1), CompletionMode::Completed).succeeded());
        assert!(!result(None, CompletionMode::Completed).succeeded());
        assert!(!result(None, CompletionMode::TimedOut { reaped: true }).succeeded());
    }

    #[test]
    fn display_spawn_error() {
        let err = EngineError::Spawn {
            program: "/opt/engine".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert!(err.to_string().starts_with("failed to start engine '/opt/engine'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn new_command_uses_default_budget() {
        let cmd = EngineCommand::new("cad3dify-engine");
        assert_eq!(cmd.timeout, Duration::from_secs(300));
        assert!(cmd.args.is_empty());
    }
}
