//! Moving commands between the foreground and the background.
//!
//! `background` starts a new external process detached from the terminal's
//! stdin, with its output buffered by the job registry. `foreground` removes a
//! running job from the registry, reattaches its output and blocks on it.

use std::io;
use std::process::Stdio;

use super::job::{ExitOutcome, JobId};
use crate::error::{ShellError, ShellResult};
use crate::stage::Stage;
use crate::tools::ExecContext;

/// Start `stage` as a new background job and return its id without waiting.
pub async fn background(stage: &Stage, ctx: &ExecContext) -> ShellResult<JobId> {
    if ctx.is_builtin(stage.name()) {
        return Err(ShellError::BuiltinInBackground {
            name: stage.name().to_string(),
        });
    }

    let child = {
        let mut cmd = ctx.command(stage);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.spawn().map_err(|source| ShellError::StageStartFailure {
            stage: 0,
            name: stage.name().to_string(),
            source,
        })?
    };

    Ok(ctx.jobs.submit(child, stage.command_line()).await)
}

/// Bring job `id` to the foreground and wait for it.
///
/// Unknown and already-completed jobs are refused without blocking.
pub async fn foreground(id: JobId, ctx: &ExecContext) -> ShellResult<()> {
    let job = ctx.jobs.take_for_foreground(id).await?;
    let command = job.command.clone();
    ctx.streams
        .print(&format!("Bringing job {} to foreground: {}\n", id, command))?;
    tracing::info!(job = %id, %command, "job brought to foreground");

    match job.attach_and_wait().await {
        outcome if outcome.success() => Ok(()),
        ExitOutcome::WaitFailed(reason) => Err(ShellError::Wait {
            name: command,
            source: io::Error::other(reason),
        }),
        outcome => Err(ShellError::JobExitFailure {
            id,
            code: outcome.code(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{captured_ctx, read};

    #[tokio::test]
    async fn test_background_output_appears_on_foreground() {
        let (ctx, out, _err) = captured_ctx();
        let id = background(&Stage::new("sh", ["-c", "sleep 0.2; echo done"]), &ctx)
            .await
            .unwrap();
        assert_eq!(id, JobId(1));
        assert_eq!(read(&out), "");

        foreground(id, &ctx).await.unwrap();
        assert_eq!(read(&out), "Bringing job 1 to foreground: sh -c sleep 0.2; echo done\ndone\n");
        assert!(ctx.jobs.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_background_refuses_builtins() {
        let (ctx, _out, _err) = captured_ctx();
        let err = background(&Stage::new("cd", ["/"]), &ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::BuiltinInBackground { ref name } if name == "cd"));
        assert!(ctx.jobs.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_background_start_failure() {
        let (ctx, _out, _err) = captured_ctx();
        let err = background(&Stage::new("no_such_command_98765", Vec::<String>::new()), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ShellError::StageStartFailure { .. }));
    }

    #[tokio::test]
    async fn test_foreground_reports_exit_status() {
        let (ctx, _out, _err) = captured_ctx();
        let id = background(&Stage::new("sh", ["-c", "sleep 0.2; exit 4"]), &ctx)
            .await
            .unwrap();
        let err = foreground(id, &ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::JobExitFailure { code: 4, .. }));
    }

    #[tokio::test]
    async fn test_foreground_completed_job_does_not_block() {
        let (ctx, _out, _err) = captured_ctx();
        let id = background(&Stage::new("true", Vec::<String>::new()), &ctx)
            .await
            .unwrap();
        ctx.jobs.wait(id).await;

        let err = foreground(id, &ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::JobAlreadyCompleted(j) if j == id));
        // Still listed: a refused fg doesn't reap.
        assert!(ctx.jobs.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_foreground_unknown_job() {
        let (ctx, _out, _err) = captured_ctx();
        let err = foreground(JobId(42), &ctx).await.unwrap_err();
        assert!(matches!(err, ShellError::UnknownJob(JobId(42))));
    }
}
