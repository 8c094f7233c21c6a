//! Engine subprocess management.
//!
//! Provides [`run_engine`]: spawn the engine, capture stdout/stderr, and
//! race the process against the configured budget. On timeout the engine's
//! whole process group is killed and reaped before returning. After a normal
//! exit the group is killed too, so no helper the engine left behind keeps
//! writing into a staging directory that is about to be removed.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::executor::{CompletionMode, EngineCommand, EngineError, EngineExecutionResult};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// How long to wait for a killed engine to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// How long to keep draining output pipes once the engine has exited.
///
/// A helper process the engine left running can hold the pipes open.
const STREAM_DRAIN: Duration = Duration::from_secs(2);

/// Run the engine once against `input` and `output`.
///
/// Returns `Ok` for every run that got as far as spawning, including
/// non-zero exits and timeouts; the caller decides what those mean.
/// The output path is not checked here.
pub async fn run_engine(
    command: &EngineCommand,
    input: &Path,
    output: &Path,
    prompt: &str,
) -> Result<EngineExecutionResult, EngineError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .arg(input)
        .arg(output)
        .arg("--prompt")
        .arg(prompt)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Covers the case where this future is dropped mid-run.
        .kill_on_drop(true);

    // Own process group, so a timeout can take down the engine's helpers too.
    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
        program: command.program.to_string_lossy().into_owned(),
        source,
    })?;

    // `Child::id` is gone once the child has been reaped.
    let pid = child.id();

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    match tokio::time::timeout(command.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let elapsed = start.elapsed();
            // Leftover helpers would otherwise outlive the job.
            kill_group(pid);
            let stdout = drain(stdout_task, STREAM_DRAIN).await;
            let stderr = drain(stderr_task, STREAM_DRAIN).await;

            Ok(EngineExecutionResult {
                exit_code: status.code(),
                stdout,
                stderr,
                elapsed,
                mode: CompletionMode::Completed,
            })
        }
        Ok(Err(e)) => {
            terminate(&mut child).await;
            stdout_task.abort();
            stderr_task.abort();
            Err(EngineError::Wait(e))
        }
        Err(_elapsed) => {
            let reaped = terminate(&mut child).await;
            let elapsed = start.elapsed();
            // Whatever the engine managed to print before it was killed.
            let stdout = drain(stdout_task, Duration::from_millis(200)).await;
            let stderr = drain(stderr_task, Duration::from_millis(200)).await;

            Ok(EngineExecutionResult {
                exit_code: None,
                stdout,
                stderr,
                elapsed,
                mode: CompletionMode::TimedOut { reaped },
            })
        }
    }
}

/// Kill the engine's process group and wait (bounded) for the child to be
/// reaped. Returns whether it was.
async fn terminate(child: &mut Child) -> bool {
    kill_group(child.id());
    let _ = child.start_kill();
    matches!(tokio::time::timeout(KILL_GRACE, child.wait()).await, Ok(Ok(_)))
}

/// Send SIGKILL to the process group led by `pid`.
///
/// ESRCH (group already empty) is ignored.
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) {
        // SAFETY: kill(2) takes plain integers and touches no memory.
        // A negative pid addresses the group created by process_group(0).
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Collect a reader task's bytes as lossy UTF-8, giving up after `limit`.
async fn drain(mut task: JoinHandle<Vec<u8>>, limit: Duration) -> String {
    match tokio::time::timeout(limit, &mut task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(_join_error)) => String::new(),
        Err(_elapsed) => {
            task.abort();
            String::new()
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
