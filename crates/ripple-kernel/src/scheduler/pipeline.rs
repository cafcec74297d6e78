//! Pipeline execution for ripple.
//!
//! Wires a sequence of stages into a chain of OS processes, where the stdout
//! of each stage is an OS pipe feeding the stdin of the next. Nothing is
//! buffered in between: the shell only passes pipe ends around.
//!
//! ```text
//!  shell stdin ──▶ stage 0 ──pipe──▶ stage 1 ──pipe──▶ stage 2 ──▶ shell stdout
//!                     │                 │                 │
//!                     └─────────────────┴─────────────────┴──▶ shell stderr
//! ```
//!
//! All stages are started before any is waited on, and the waits run
//! concurrently. An early stage blocked on a full pipe therefore always has a
//! running consumer.
//!
//! A builtin may run as the only stage, or at the head of a pipeline where its
//! output is fed to stage 1. Anywhere else it would need piped input, which
//! in-process builtins can't read, so the pipeline is refused before anything
//! starts.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::task::JoinHandle;

use super::job::ExitOutcome;
use crate::error::{ShellError, ShellResult};
use crate::stage::Stage;
use crate::tools::{BuiltinTable, ExecContext};

/// What happens to stages that already started when a later stage fails to
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Leave them to run to completion; a detached task reaps them. With their
    /// downstream reader gone they usually end on the next write.
    #[default]
    LeaveRunning,
    /// Kill them immediately.
    Kill,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leave" | "leave-running" | "leave_running" => Ok(OrphanPolicy::LeaveRunning),
            "kill" => Ok(OrphanPolicy::Kill),
            other => Err(format!("unknown orphan policy: {other} (expected 'leave' or 'kill')")),
        }
    }
}

/// A stage whose process has been spawned.
struct StartedStage {
    /// Position in the full pipeline (including a leading builtin).
    index: usize,
    name: String,
    child: Child,
    /// Task writing a leading builtin's output into this stage's stdin.
    feeder: Option<JoinHandle<()>>,
}

/// Runs pipelines against the OS process layer.
pub struct PipelineRunner {
    builtins: Arc<BuiltinTable>,
    orphan_policy: OrphanPolicy,
}

impl PipelineRunner {
    /// Create a runner dispatching builtins through `builtins`.
    pub fn new(builtins: Arc<BuiltinTable>, orphan_policy: OrphanPolicy) -> Self {
        Self {
            builtins,
            orphan_policy,
        }
    }

    /// Execute a pipeline of stages.
    ///
    /// Returns the first failure in pipeline order: a stage that failed to
    /// start, or (after every started stage has been waited on) a stage that
    /// exited unsuccessfully.
    pub async fn run(&self, stages: &[Stage], ctx: &mut ExecContext) -> ShellResult<()> {
        match stages {
            [] => Ok(()),
            [stage] => self.run_single(stage, ctx).await,
            _ => self.run_pipeline(stages, ctx).await,
        }
    }

    /// Single stage: builtin dispatch, or one process on the shell's own
    /// streams with no pipes at all.
    async fn run_single(&self, stage: &Stage, ctx: &mut ExecContext) -> ShellResult<()> {
        if let Some(builtin) = self.builtins.get(stage.name()) {
            let out = builtin
                .execute(stage.args(), ctx)
                .await
                .into_shell_result(stage.name())?;
            ctx.streams.print(&out)?;
            return Ok(());
        }
        self.run_external(std::slice::from_ref(stage), 0, None, ctx).await
    }

    /// Multi-stage pipeline.
    async fn run_pipeline(&self, stages: &[Stage], ctx: &mut ExecContext) -> ShellResult<()> {
        if let Some((index, stage)) = stages
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, stage)| self.builtins.contains(stage.name()))
        {
            return Err(ShellError::UnsupportedBuiltinRedirection {
                stage: index,
                name: stage.name().to_string(),
            });
        }

        let head = &stages[0];
        match self.builtins.get(head.name()) {
            Some(builtin) => {
                let out = builtin
                    .execute(head.args(), ctx)
                    .await
                    .into_shell_result(head.name())?;
                self.run_external(&stages[1..], 1, Some(out.into_bytes()), ctx)
                    .await
            }
            None => self.run_external(stages, 0, None, ctx).await,
        }
    }

    /// Start every stage, then wait on all of them.
    async fn run_external(
        &self,
        stages: &[Stage],
        offset: usize,
        feed: Option<Vec<u8>>,
        ctx: &ExecContext,
    ) -> ShellResult<()> {
        let mut started = Vec::with_capacity(stages.len());
        if let Err(e) = start_all(stages, offset, feed, ctx, &mut started) {
            self.abandon(started);
            return Err(e);
        }
        wait_all(started).await
    }

    /// Deal with stages that started before the pipeline was aborted.
    fn abandon(&self, started: Vec<StartedStage>) {
        for mut stage in started {
            if let Some(feeder) = stage.feeder.take() {
                feeder.abort();
            }
            if self.orphan_policy == OrphanPolicy::Kill {
                if let Err(e) = stage.child.start_kill() {
                    tracing::warn!(
                        stage = stage.index,
                        name = %stage.name,
                        "failed to kill orphaned stage: {}",
                        e
                    );
                }
            }
            tracing::warn!(
                stage = stage.index,
                name = %stage.name,
                pid = ?stage.child.id(),
                policy = ?self.orphan_policy,
                "pipeline aborted after stage started"
            );
            tokio::spawn(async move {
                match stage.child.wait().await {
                    Ok(status) => {
                        tracing::debug!(name = %stage.name, %status, "orphaned stage reaped")
                    }
                    Err(e) => {
                        tracing::debug!(name = %stage.name, "failed to reap orphaned stage: {}", e)
                    }
                }
            });
        }
    }
}

/// Spawn each stage in order, handing stage i's stdout read-end to stage i+1.
///
/// Every spawned child is pushed to `started` before anything else can fail,
/// so the caller always sees the full set of processes to clean up. A read-end
/// still held here when an error returns is dropped (closed) on the way out.
fn start_all(
    stages: &[Stage],
    offset: usize,
    mut feed: Option<Vec<u8>>,
    ctx: &ExecContext,
    started: &mut Vec<StartedStage>,
) -> ShellResult<()> {
    let last = stages.len().saturating_sub(1);
    let mut upstream: Option<ChildStdout> = None;

    for (pos, stage) in stages.iter().enumerate() {
        let index = offset + pos;
        let name = stage.name().to_string();
        let mut feed_bytes = None;

        let stdin: Stdio = match upstream.take() {
            Some(read_end) => read_end.try_into().map_err(|e: io::Error| {
                ShellError::PipeCreationFailure {
                    stage: index,
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => match feed.take() {
                Some(bytes) => {
                    feed_bytes = Some(bytes);
                    Stdio::piped()
                }
                None => ctx.streams.stdin.stdio()?,
            },
        };
        let stdout = if pos == last {
            ctx.streams.stdout.stdio()?
        } else {
            Stdio::piped()
        };

        let mut child = {
            // The command (and with it the parent's copy of the upstream
            // read-end) is dropped as soon as the child has its own.
            let mut cmd = ctx.command(stage);
            cmd.stdin(stdin)
                .stdout(stdout)
                .stderr(ctx.streams.stderr.stdio()?);
            cmd.spawn()
                .map_err(|source| start_error(index, &name, pos < last, source))?
        };
        tracing::debug!(stage = index, %name, pid = ?child.id(), "stage started");

        let feeder = feed_bytes.and_then(|bytes| {
            child
                .stdin
                .take()
                .map(|stdin| tokio::spawn(feed_stdin(stdin, bytes)))
        });
        let read_end = if pos < last { child.stdout.take() } else { None };
        started.push(StartedStage {
            index,
            name: name.clone(),
            child,
            feeder,
        });

        if pos < last {
            upstream = Some(read_end.ok_or_else(|| ShellError::PipeCreationFailure {
                stage: index,
                name,
                reason: "stdout pipe unavailable".to_string(),
            })?);
        }
    }

    Ok(())
}

/// Wait on every started stage concurrently and report the first failure.
async fn wait_all(mut started: Vec<StartedStage>) -> ShellResult<()> {
    let last = started.last().map(|s| s.index).unwrap_or_default();
    let statuses = join_all(started.iter_mut().map(|stage| stage.child.wait())).await;

    let mut first_failure = None;
    for (stage, status) in started.into_iter().zip(statuses) {
        if let Some(feeder) = stage.feeder {
            feeder.abort();
        }
        let failure = match status {
            Ok(status) if status.success() => None,
            Ok(status) if stage.index < last && killed_by_sigpipe(&status) => {
                tracing::debug!(
                    stage = stage.index,
                    name = %stage.name,
                    "stage ended by broken pipe"
                );
                None
            }
            Ok(status) => Some(ShellError::StageExitFailure {
                stage: stage.index,
                name: stage.name,
                code: ExitOutcome::from(status).code(),
            }),
            Err(source) => Some(ShellError::Wait {
                name: stage.name,
                source,
            }),
        };
        if let Some(err) = failure {
            if first_failure.is_none() {
                first_failure = Some(err);
            } else {
                tracing::debug!("additional pipeline stage failure: {}", err);
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Write a leading builtin's output into the next stage. Dropping `stdin`
/// at the end delivers EOF.
async fn feed_stdin(mut stdin: ChildStdin, bytes: Vec<u8>) {
    if let Err(e) = stdin.write_all(&bytes).await {
        tracing::debug!("pipeline stdin closed early: {}", e);
    }
}

fn start_error(stage: usize, name: &str, wants_pipe: bool, source: io::Error) -> ShellError {
    if wants_pipe && is_descriptor_exhaustion(&source) {
        ShellError::PipeCreationFailure {
            stage,
            name: name.to_string(),
            reason: source.to_string(),
        }
    } else {
        ShellError::StageStartFailure {
            stage,
            name: name.to_string(),
            source,
        }
    }
}

#[cfg(unix)]
fn is_descriptor_exhaustion(e: &io::Error) -> bool {
    use nix::errno::Errno;
    matches!(
        e.raw_os_error(),
        Some(code) if code == Errno::EMFILE as i32 || code == Errno::ENFILE as i32
    )
}

#[cfg(not(unix))]
fn is_descriptor_exhaustion(_e: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn killed_by_sigpipe(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(nix::sys::signal::Signal::SIGPIPE as i32)
}

#[cfg(not(unix))]
fn killed_by_sigpipe(_status: &ExitStatus) -> bool {
    false
}
