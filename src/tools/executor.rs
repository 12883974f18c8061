//! Command Executor - runs external processes for shell-backed tools
//!
//! Information Hiding:
//! - Process spawning and output capture hidden behind trait
//! - Child teardown on cancellation handled internally
//! - Test double records invocations instead of spawning

use super::CallContext;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Mutex;
use thiserror::Error;
use tokio::process::Command;

/// Fully described process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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

    /// `bash -c <command> <args...>`
    pub fn bash(command: &str, args: &[String]) -> Self {
        Self::new("bash").arg("-c").arg(command).args(args.iter().cloned())
    }

    /// `git -C <repo_path> <command> <args...>`
    pub fn git(repo_path: &str, command: &str, args: &[String]) -> Self {
        Self::new("git")
            .arg("-C")
            .arg(repo_path)
            .arg(command)
            .args(args.iter().cloned())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully. `output` is the combined
    /// stdout and stderr it produced.
    #[error("{}: {}", exit_label(.code), String::from_utf8_lossy(.output).trim_end())]
    Failed { code: Option<i32>, output: Vec<u8> },

    #[error("'{program}' cancelled before completion")]
    Cancelled { program: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Runs a [`CommandSpec`] to completion and returns its combined output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, ctx: &CallContext, spec: &CommandSpec)
        -> Result<Vec<u8>, CommandError>;
}

/// Spawns real processes through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        ctx: &CallContext,
        spec: &CommandSpec,
    ) -> Result<Vec<u8>, CommandError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(command = %spec, "Spawning process");

        // Dropping the output future kills the child.
        let output = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                tracing::warn!(command = %spec, "Process cancelled");
                return Err(CommandError::Cancelled {
                    program: spec.program.clone(),
                });
            }
            output = command.output() => output.map_err(|source| CommandError::Spawn {
                program: spec.program.clone(),
                source,
            })?,
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            Ok(combined)
        } else {
            Err(CommandError::Failed {
                code: output.status.code(),
                output: combined,
            })
        }
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Output(Vec<u8>),
    Failed { code: Option<i32>, output: Vec<u8> },
}

/// Deterministic executor double: returns a programmed result and records
/// every invocation it receives.
#[derive(Debug)]
pub struct RecordingExecutor {
    response: Canned,
    calls: Mutex<Vec<CommandSpec>>,
}

impl RecordingExecutor {
    pub fn succeeding(output: impl Into<Vec<u8>>) -> Self {
        Self::with_response(Canned::Output(output.into()))
    }

    pub fn failing(code: Option<i32>, output: impl Into<Vec<u8>>) -> Self {
        Self::with_response(Canned::Failed {
            code,
            output: output.into(),
        })
    }

    fn with_response(response: Canned) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Invocations received so far, oldest first.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(
        &self,
        _ctx: &CallContext,
        spec: &CommandSpec,
    ) -> Result<Vec<u8>, CommandError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(spec.clone());

        match &self.response {
            Canned::Output(output) => Ok(output.clone()),
            Canned::Failed { code, output } => Err(CommandError::Failed {
                code: *code,
                output: output.clone(),
            }),
        }
    }
}
