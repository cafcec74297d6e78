//! echo: Print arguments to stdout.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Echo builtin: prints its arguments separated by spaces.
pub struct Echo;

#[async_trait]
impl Builtin for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("echo", "Echo the input text back to the user")
            .usage("echo [-n] [args...]")
    }

    async fn execute(&self, args: &[String], _ctx: &mut ExecContext) -> ExecResult {
        // -n suppresses the trailing newline
        let (no_newline, words) = match args.split_first() {
            Some((flag, rest)) if flag == "-n" => (true, rest),
            _ => (false, args),
        };

        let mut output = words.join(" ");
        if !no_newline {
            output.push('\n');
        }
        ExecResult::success(output)
    }
}
