//! External process execution
//!
//! Runs a command with a wall-clock budget, captures its output and folds
//! every outcome (success, non-zero exit, timeout, missing binary, I/O
//! failure) into an [`ExecutionResult`]. Nothing escapes as an error.

use crate::monitor::CommandLine;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Default wall-clock budget for one command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long to wait for pipes to close after killing a timed-out child
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Message used when a successful command printed nothing
pub const GENERIC_SUCCESS: &str = "Command executed successfully.";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Exit code zero
    Success,
    /// Non-zero exit code, or terminated by a signal
    ProcessError,
    /// Killed after exceeding the budget
    Timeout,
    /// Program could not be found at spawn time
    ExecutableNotFound,
    /// Any other failure (permissions, pipes, ...)
    Unexpected,
}

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the command succeeded
    pub succeeded: bool,
    /// Human-readable summary
    pub message: String,
    /// Captured stdout followed by stderr, untrimmed
    pub raw_output: String,
    /// Classification of the outcome
    pub outcome: ExecutionOutcome,
}

impl ExecutionResult {
    fn success(message: String, raw_output: String) -> Self {
        Self {
            succeeded: true,
            message,
            raw_output,
            outcome: ExecutionOutcome::Success,
        }
    }

    fn failure(outcome: ExecutionOutcome, message: String, raw_output: String) -> Self {
        Self {
            succeeded: false,
            message,
            raw_output,
            outcome,
        }
    }
}

/// Runs external commands with a bounded timeout
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    /// Create an executor with the given budget
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured budget
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` to completion or until the budget expires
    pub async fn execute(&self, command: &CommandLine) -> ExecutionResult {
        debug!("Executing command: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("Executable not found: {:?}", command.program);
                return ExecutionResult::failure(
                    ExecutionOutcome::ExecutableNotFound,
                    format!("Executable '{}' not found.", command.program.display()),
                    String::new(),
                );
            }
            Err(e) => {
                error!("Failed to spawn {}: {}", command, e);
                return unexpected(&e);
            }
        };

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                error!("Failed to wait for {}: {}", command, e);
                let _ = child.kill().await;
                drain(stdout).await;
                drain(stderr).await;
                return unexpected(&e);
            }
            Err(_) => {
                warn!(
                    "Command timed out after {:?}, killing: {}",
                    self.timeout, command
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out command: {}", e);
                }
                let out = drain(stdout).await;
                let err = drain(stderr).await;
                return ExecutionResult::failure(
                    ExecutionOutcome::Timeout,
                    "Command timed out.".to_string(),
                    combine(&out, &err),
                );
            }
        };

        let out = drain(stdout).await;
        let err = drain(stderr).await;
        let raw_output = combine(&out, &err);

        if status.success() {
            let trimmed = out.trim();
            let message = if trimmed.is_empty() {
                GENERIC_SUCCESS.to_string()
            } else {
                trimmed.to_string()
            };
            info!("Command successful: {} -> {}", command, message);
            return ExecutionResult::success(message, raw_output);
        }

        let detail = if !err.trim().is_empty() {
            err.trim().to_string()
        } else if !out.trim().is_empty() {
            out.trim().to_string()
        } else {
            match status.code() {
                Some(code) => format!("Unknown error (exit code: {})", code),
                None => "Unknown error (terminated by signal)".to_string(),
            }
        };

        error!("Command failed: {} -> {}", command, detail);
        ExecutionResult::failure(
            ExecutionOutcome::ProcessError,
            format!("Command failed: {}", detail),
            raw_output,
        )
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn unexpected(e: &io::Error) -> ExecutionResult {
    ExecutionResult::failure(
        ExecutionOutcome::Unexpected,
        format!("Unexpected error: {}", e),
        String::new(),
    )
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pipe.map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("Pipe read ended early: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

/// Collect a reader's output. Bounded so an orphaned grandchild holding the
/// pipe open cannot stall the request.
async fn drain(reader: Option<JoinHandle<String>>) -> String {
    let Some(mut handle) = reader else {
        return String::new();
    };

    match timeout(DRAIN_GRACE, &mut handle).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("Output reader failed: {}", e);
            String::new()
        }
        Err(_) => {
            handle.abort();
            debug!("Output reader did not finish within {:?}", DRAIN_GRACE);
            String::new()
        }
    }
}

fn combine(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        stdout.to_string()
    } else if stdout.is_empty() {
        stderr.to_string()
    } else {
        format!("{}\n{}", stdout, stderr)
    }
}
