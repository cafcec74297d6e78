//! env / export: Inspect and extend the environment of spawned processes.
//!
//! Overrides live in the session, not the shell's own process environment;
//! every external stage gets them applied at spawn time.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Env builtin: print the environment children will see.
pub struct Env;

#[async_trait]
impl Builtin for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("env", "Print environment variables")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let out: String = ctx
            .state
            .environment()
            .iter()
            .map(|(name, value)| format!("{}={}\n", name, value))
            .collect();
        ExecResult::success(out)
    }
}

/// Export builtin: set environment overrides.
///
/// - `export NAME=VALUE...`: Set one or more variables
/// - `export`: Print the session's overrides
pub struct Export;

#[async_trait]
impl Builtin for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("export", "Set or modify environment variables")
            .usage("export [NAME=VALUE...]")
            .example("Set a variable", "export EDITOR=vim")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        if args.is_empty() {
            let out: String = ctx
                .state
                .env_overrides()
                .iter()
                .map(|(name, value)| format!("export {}={}\n", name, value))
                .collect();
            return ExecResult::success(out);
        }

        // Validate everything before applying anything.
        let mut pairs = Vec::with_capacity(args.len());
        for arg in args {
            match arg.split_once('=') {
                Some((name, value)) if is_valid_name(name) => pairs.push((name, value)),
                _ => {
                    return ExecResult::failure(
                        1,
                        format!("{}: argument must be in the format NAME=VALUE", arg),
                    );
                }
            }
        }
        for (name, value) in pairs {
            ctx.state.set_env(name, value);
        }
        ExecResult::success("")
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, captured_ctx};

    #[tokio::test]
    async fn test_export_then_env() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Export.execute(&args(&["RIPPLE_A=1", "RIPPLE_B=two=2"]), &mut ctx).await;
        assert!(result.ok());

        let env = Env.execute(&[], &mut ctx).await;
        assert!(env.out.contains("RIPPLE_A=1\n"));
        assert!(env.out.contains("RIPPLE_B=two=2\n"));

        let listing = Export.execute(&[], &mut ctx).await;
        assert_eq!(listing.out, "export RIPPLE_A=1\nexport RIPPLE_B=two=2\n");
    }

    #[tokio::test]
    async fn test_export_rejects_malformed() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Export.execute(&args(&["GOOD=1", "bad"]), &mut ctx).await;
        assert!(!result.ok());
        assert_eq!(result.err, "bad: argument must be in the format NAME=VALUE");
        assert!(ctx.state.env_overrides().is_empty());

        assert!(!Export.execute(&args(&["1X=y"]), &mut ctx).await.ok());
    }
}
