//! Errors surfaced by the engine.
//!
//! Every variant renders as a single line; the REPL prefixes it with the
//! shell's name before printing. None of them are fatal to the shell.

use std::io;

use thiserror::Error;

use crate::scheduler::JobId;

/// Result type for engine operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Engine errors.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Executable not found, permission denied, or any other spawn failure.
    #[error("{name}: failed to start command (stage {stage}): {source}")]
    StageStartFailure {
        stage: usize,
        name: String,
        #[source]
        source: io::Error,
    },

    /// An inter-stage pipe could not be created or handed over.
    #[error("{name}: failed to create pipe (stage {stage}): {reason}")]
    PipeCreationFailure {
        stage: usize,
        name: String,
        reason: String,
    },

    /// A stage started but exited unsuccessfully.
    #[error("{name}: command failed with status {code} (stage {stage})")]
    StageExitFailure { stage: usize, name: String, code: i32 },

    /// A builtin was placed where it would have to read piped input.
    #[error("{name}: input redirection not supported for builtin commands (stage {stage})")]
    UnsupportedBuiltinRedirection { stage: usize, name: String },

    /// `bg` was asked to run a builtin.
    #[error("{name}: builtin commands cannot run in the background")]
    BuiltinInBackground { name: String },

    /// A builtin handler reported failure.
    #[error("{name}: {message}")]
    BuiltinFailure {
        name: String,
        code: i64,
        message: String,
    },

    #[error("no such job: {0}")]
    UnknownJob(JobId),

    #[error("job {0} has already completed")]
    JobAlreadyCompleted(JobId),

    /// A job brought to the foreground exited unsuccessfully.
    #[error("job {id} exited with status {code}")]
    JobExitFailure { id: JobId, code: i32 },

    /// Waiting on a started process failed at the OS layer.
    #[error("error waiting for {name}: {source}")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Bad arguments to an engine entry point.
    #[error("{0}")]
    Usage(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Exit status the REPL should report for this error.
    pub fn code(&self) -> i32 {
        match self {
            ShellError::StageStartFailure { .. } => 127,
            ShellError::StageExitFailure { code, .. } | ShellError::JobExitFailure { code, .. } => {
                *code
            }
            ShellError::BuiltinFailure { code, .. } => i32::try_from(*code).unwrap_or(1),
            _ => 1,
        }
    }
}
