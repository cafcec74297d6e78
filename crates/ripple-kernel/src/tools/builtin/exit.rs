//! exit: Leave the shell.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Exit builtin: asks the REPL to exit once the current line finishes.
pub struct Exit;

#[async_trait]
impl Builtin for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("exit", "Exit the shell").usage("exit [code]")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let code = match args.first() {
            None => 0,
            Some(arg) => match arg.parse::<i32>() {
                Ok(code) => code,
                Err(_) => {
                    return ExecResult::failure(2, format!("{}: numeric argument required", arg));
                }
            },
        };
        ctx.state.request_exit(code);
        ExecResult::success("")
    }
}
