//! fg: Bring a background job to the foreground.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::scheduler::{control, JobId};
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Fg builtin: reattach a running background job and wait for it.
pub struct Fg;

#[async_trait]
impl Builtin for Fg {
    fn name(&self) -> &str {
        "fg"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("fg", "Bring a background job to the foreground")
            .usage("fg <id>")
            .example("Resume job 2", "fg 2")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let Some(arg) = args.first() else {
            return ExecResult::failure(1, "requires a job ID");
        };
        let id: JobId = match arg.parse() {
            Ok(id) => id,
            Err(_) => return ExecResult::failure(1, format!("invalid job ID: {}", arg)),
        };

        match control::foreground(id, ctx).await {
            Ok(()) => ExecResult::success(""),
            Err(e) => ExecResult::from_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, captured_ctx};

    #[tokio::test]
    async fn test_fg_argument_errors() {
        let (mut ctx, _out, _err) = captured_ctx();
        assert_eq!(Fg.execute(&[], &mut ctx).await.err, "requires a job ID");
        assert_eq!(
            Fg.execute(&args(&["x"]), &mut ctx).await.err,
            "invalid job ID: x"
        );
    }

    #[tokio::test]
    async fn test_fg_unknown_job() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Fg.execute(&args(&["%9"]), &mut ctx).await;
        assert_eq!(result.err, "no such job: 9");
    }
}
