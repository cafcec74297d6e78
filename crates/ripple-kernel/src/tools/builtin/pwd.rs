//! pwd: Print working directory.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Pwd builtin: print the session's working directory.
pub struct Pwd;

#[async_trait]
impl Builtin for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("pwd", "Print the current working directory")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.state.cwd().display()))
    }
}
