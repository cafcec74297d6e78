//! bg: Start a command in the background.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::scheduler::control;
use crate::stage::Stage;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Bg builtin: start a new external process as a background job.
///
/// Takes a command line, not a job id. Prints `[id] command` and returns
/// without waiting.
pub struct Bg;

#[async_trait]
impl Builtin for Bg {
    fn name(&self) -> &str {
        "bg"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("bg", "Run a command in the background")
            .usage("bg <command> [args...]")
            .example("Start a long job", "bg sleep 30")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let Some((name, rest)) = args.split_first() else {
            return ExecResult::failure(1, "requires a command");
        };
        let stage = ctx.state.expand(Stage::new(name.as_str(), rest.iter().cloned()));

        match control::background(&stage, ctx).await {
            Ok(id) => ExecResult::success(format!("[{}] {}\n", id, stage.command_line())),
            Err(e) => ExecResult::from_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::JobId;
    use crate::tools::test_support::{args, captured_ctx};

    #[tokio::test]
    async fn test_bg_reports_id_and_command() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Bg.execute(&args(&["sleep", "0.1"]), &mut ctx).await;
        assert!(result.ok(), "{}", result.err);
        assert_eq!(result.out, "[1] sleep 0.1\n");

        let result = Bg.execute(&args(&["true"]), &mut ctx).await;
        assert_eq!(result.out, "[2] true\n");
        assert!(ctx.jobs.get(JobId(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_bg_expands_aliases() {
        let (mut ctx, _out, _err) = captured_ctx();
        ctx.state.set_alias("nap", "sleep 0.1");
        let result = Bg.execute(&args(&["nap"]), &mut ctx).await;
        assert_eq!(result.out, "[1] sleep 0.1\n");
    }

    #[tokio::test]
    async fn test_bg_rejects_builtin() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Bg.execute(&args(&["cd", "/"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("cannot run in the background"));
    }

    #[tokio::test]
    async fn test_bg_requires_command() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Bg.execute(&[], &mut ctx).await;
        assert_eq!(result.err, "requires a command");
    }
}
