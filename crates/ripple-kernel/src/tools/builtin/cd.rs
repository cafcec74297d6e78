//! cd: Change working directory.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Cd builtin: change the session's working directory.
///
/// External processes started afterwards run in the new directory. The shell
/// process itself never changes directory.
pub struct Cd;

#[async_trait]
impl Builtin for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("cd", "Change the current directory")
            .usage("cd [dir|~|..|-]")
            .example("Go home", "cd")
            .example("Go back to the previous directory", "cd -")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let target = args.first().map(String::as_str).unwrap_or("~");

        // Handle `cd -` for previous directory
        let resolved: PathBuf = match target {
            "-" => match ctx.state.prev_cwd() {
                Some(prev) => prev.to_path_buf(),
                None => return ExecResult::failure(1, "OLDPWD not set"),
            },
            "~" => home_dir(ctx),
            ".." => match ctx.state.cwd().parent() {
                Some(parent) => parent.to_path_buf(),
                None => ctx.state.cwd().to_path_buf(),
            },
            other => match other.strip_prefix("~/") {
                Some(rest) => home_dir(ctx).join(rest),
                None => ctx.state.resolve(other),
            },
        };

        let resolved = match tokio::fs::canonicalize(&resolved).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return ExecResult::failure(1, format!("directory does not exist: {}", target));
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return ExecResult::failure(1, format!("permission denied: {}", target));
            }
            Err(e) => return ExecResult::failure(1, format!("{}: {}", target, e)),
        };
        if !resolved.is_dir() {
            return ExecResult::failure(1, format!("{}: Not a directory", target));
        }

        tracing::debug!(cwd = %resolved.display(), "changed directory");
        ctx.state.set_cwd(resolved.clone());
        // For `cd -`, output the new directory (like bash)
        if target == "-" {
            ExecResult::success(format!("{}\n", resolved.display()))
        } else {
            ExecResult::success("")
        }
    }
}

fn home_dir(ctx: &ExecContext) -> PathBuf {
    ctx.state
        .env_overrides()
        .get("HOME")
        .cloned()
        .or_else(|| std::env::var("HOME").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}
