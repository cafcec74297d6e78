//! source: Run the lines of a file through the shell.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Source builtin: queue each non-empty line of a file for execution.
///
/// The lines run after the current one, in this session, so `cd`, `alias`
/// and `export` inside the file take effect. A failing line is reported and
/// the rest still run.
pub struct Source;

#[async_trait]
impl Builtin for Source {
    fn name(&self) -> &str {
        "source"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("source", "Execute commands from a file").usage("source <file>")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let Some(file) = args.first() else {
            return ExecResult::failure(1, "requires a filename");
        };
        let path = ctx.state.resolve(file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => return ExecResult::failure(1, format!("{}: {}", file, e)),
        };

        ctx.queue_lines(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
        ExecResult::success("")
    }
}
