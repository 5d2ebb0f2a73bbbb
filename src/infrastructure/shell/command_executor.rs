//! Command executor for external tools
//!
//! Schema conversion and source reformatting shell out to third-party
//! binaries. Every call returns a structured [`ToolFailure`] instead of
//! raising, so call sites decide whether a failure aborts the run or is
//! logged and skipped.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Default bound for one external tool call
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// One external program call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Human-readable command line for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a successful call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why an external tool call did not succeed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolFailure {
    #[error("'{program}' was not found on the system path")]
    NotFound { program: String },

    #[error("failed to start '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("'{program}' did not finish within {}s", .after.as_secs())]
    TimedOut { program: String, after: Duration },

    #[error("'{program}' exited with status {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },
}

/// Runs external programs
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Locate a program on the system path
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run a program to completion within its timeout
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolFailure>;
}

/// Executor backed by `tokio::process`
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolFailure> {
        let program = invocation.program.clone();
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %invocation.command_line(), "Running external tool");

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolFailure::NotFound {
                    program: program.clone(),
                }
            } else {
                ToolFailure::Spawn {
                    program: program.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolFailure::TimedOut {
                program: program.clone(),
                after: invocation.timeout,
            })?
            .map_err(|e| ToolFailure::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(ToolFailure::NonZeroExit {
                program,
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Mock command executor for testing
#[cfg(test)]
pub struct MockCommandExecutor {
    pub available: std::collections::HashSet<String>,
    pub results: std::collections::HashMap<String, Result<CommandOutput, ToolFailure>>,
    pub calls: std::sync::Mutex<Vec<Invocation>>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            available: std::collections::HashSet::new(),
            results: std::collections::HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Make a program visible to `locate`
    pub fn with_program(mut self, program: &str) -> Self {
        self.available.insert(program.to_string());
        self
    }

    pub fn with_result(mut self, program: &str, result: Result<CommandOutput, ToolFailure>) -> Self {
        self.available.insert(program.to_string());
        self.results.insert(program.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.available
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolFailure> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.results
            .get(&invocation.program)
            .cloned()
            .unwrap_or_else(|| {
                Err(ToolFailure::NotFound {
                    program: invocation.program.clone(),
                })
            })
    }
}
