//! ExecResult: What an in-process builtin hands back to the executor.

use crate::error::ShellError;

/// The result of running a builtin.
///
/// `out` is written to the shell's stdout (or fed to the next stage when the
/// builtin heads a pipeline). A non-zero `code` turns into
/// [`ShellError::BuiltinFailure`] carrying `err`, which should not repeat the
/// builtin's name. Builtins that fail with an engine error keep it in
/// `error` so callers can still match on its kind.
#[derive(Debug, Default)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i64,
    /// Standard output text.
    pub out: String,
    /// Error message if failed.
    pub err: String,
    /// Typed engine error behind a failure, if any.
    pub error: Option<ShellError>,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
            error: None,
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i64, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
            error: None,
        }
    }

    /// Create a failed result from an engine error, keeping the error itself.
    pub fn from_error(error: ShellError) -> Self {
        Self {
            code: i64::from(error.code()),
            out: String::new(),
            err: error.to_string(),
            error: Some(error),
        }
    }

    /// True if the exit code is 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// Convert into the engine's error type, attributing failure to `name`.
    pub fn into_shell_result(self, name: &str) -> Result<String, ShellError> {
        if self.ok() {
            Ok(self.out)
        } else if let Some(error) = self.error {
            Err(error)
        } else {
            let message = match self.err.trim() {
                "" => format!("exited with status {}", self.code),
                msg => msg.to_string(),
            };
            Err(ShellError::BuiltinFailure {
                name: name.to_string(),
                code: self.code,
                message,
            })
        }
    }
}
