//! Execution context for builtins.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::process::Command;

use crate::scheduler::JobRegistry;
use crate::session::SessionState;
use crate::stage::Stage;
use crate::streams::ShellStreams;
use crate::tools::BuiltinTable;

/// Execution context passed to builtins and the pipeline runner.
///
/// Owned by the kernel and only ever borrowed from the main loop.
pub struct ExecContext {
    /// History, aliases, environment overrides and cwd.
    pub state: SessionState,
    /// The shell's own standard streams.
    pub streams: ShellStreams,
    /// Background jobs.
    pub jobs: Arc<JobRegistry>,
    /// Builtin table (for `help` and `bg`).
    pub builtins: Arc<BuiltinTable>,
    /// Lines queued by `source`, run by the kernel after the current line.
    pending: VecDeque<String>,
}

impl ExecContext {
    /// Create a context.
    pub fn new(
        state: SessionState,
        streams: ShellStreams,
        jobs: Arc<JobRegistry>,
        builtins: Arc<BuiltinTable>,
    ) -> Self {
        Self {
            state,
            streams,
            jobs,
            builtins,
            pending: VecDeque::new(),
        }
    }

    /// Build an OS command for an external stage, starting in the session cwd
    /// with the session's environment overrides applied.
    pub fn command(&self, stage: &Stage) -> Command {
        let mut cmd = Command::new(stage.name());
        cmd.args(stage.args())
            .current_dir(self.state.cwd())
            .envs(self.state.env_overrides());
        cmd
    }

    /// True if `name` runs in-process.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }

    /// Queue lines to be executed after the current one.
    pub fn queue_lines<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        self.pending.extend(lines);
    }

    /// Take every queued line.
    pub fn take_pending(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::captured_ctx;
    use std::path::PathBuf;

    #[test]
    fn test_pending_lines_drain_in_order() {
        let (mut ctx, _out, _err) = captured_ctx();
        ctx.queue_lines(["a".to_string(), "b".to_string()]);
        assert_eq!(ctx.take_pending(), vec!["a", "b"]);
        assert!(ctx.take_pending().is_empty());
    }

    #[tokio::test]
    async fn test_command_uses_session_cwd_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, out, _err) = captured_ctx();
        ctx.state.set_cwd(PathBuf::from(dir.path()));
        ctx.state.set_env("RIPPLE_TEST_VAR", "xyzzy");

        let status = ctx
            .command(&Stage::new("sh", ["-c", "echo $RIPPLE_TEST_VAR; pwd"]))
            .stdout(ctx.streams.stdout.stdio().unwrap())
            .status()
            .await
            .unwrap();
        assert!(status.success());

        let text = std::fs::read_to_string(out.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("xyzzy"));
        let pwd = PathBuf::from(lines.next().unwrap());
        assert_eq!(pwd.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
    }
}
