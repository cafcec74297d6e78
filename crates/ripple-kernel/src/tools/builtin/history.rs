//! history: Show the session's command history.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// History builtin: numbered list of executed lines, oldest first.
pub struct History;

#[async_trait]
impl Builtin for History {
    fn name(&self) -> &str {
        "history"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("history", "Display command history")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let out: String = ctx
            .state
            .history()
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{} {}\n", i + 1, line))
            .collect();
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::captured_ctx;

    #[tokio::test]
    async fn test_history_numbering() {
        let (mut ctx, _out, _err) = captured_ctx();
        ctx.state.record("ls");
        ctx.state.record("echo hi | wc -c");
        let result = History.execute(&[], &mut ctx).await;
        assert_eq!(result.out, "1 ls\n2 echo hi | wc -c\n");
    }
}
