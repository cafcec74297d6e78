//! alias / unalias: Manage command aliases.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Alias builtin: define, list, or show command aliases.
///
/// - `alias`: List all aliases
/// - `alias name=command args...`: Define alias (the remaining words are
///   part of the expansion, since the stage parser splits on whitespace)
/// - `alias name...`: Show the named aliases
pub struct Alias;

#[async_trait]
impl Builtin for Alias {
    fn name(&self) -> &str {
        "alias"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("alias", "Create an alias for a command")
            .usage("alias [name=command args...]")
            .example("Define an alias", "alias ll=ls -l")
            .example("List aliases", "alias")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let Some(first) = args.first() else {
            let listing: String = ctx
                .state
                .aliases()
                .map(|(name, command)| format!("alias {}='{}'\n", name, command))
                .collect();
            return ExecResult::success(listing);
        };

        if let Some((name, command)) = first.split_once('=') {
            if name.is_empty() {
                return ExecResult::failure(1, "argument must be in the format name=command");
            }
            let mut expansion = command.to_string();
            for word in &args[1..] {
                if !expansion.is_empty() {
                    expansion.push(' ');
                }
                expansion.push_str(word);
            }
            ctx.state.set_alias(name, expansion);
            return ExecResult::success("");
        }

        let mut out = String::new();
        for name in args {
            match ctx.state.alias(name) {
                Some(command) => out.push_str(&format!("alias {}='{}'\n", name, command)),
                None => return ExecResult::failure(1, format!("{}: not found", name)),
            }
        }
        ExecResult::success(out)
    }
}

/// Unalias builtin: remove aliases.
pub struct Unalias;

#[async_trait]
impl Builtin for Unalias {
    fn name(&self) -> &str {
        "unalias"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("unalias", "Remove an alias").usage("unalias name...")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        if args.is_empty() {
            return ExecResult::failure(1, "requires an argument");
        }
        let missing: Vec<&str> = args
            .iter()
            .filter(|name| !ctx.state.remove_alias(name))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            ExecResult::success("")
        } else {
            ExecResult::failure(1, format!("{}: not found", missing.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, captured_ctx};

    #[tokio::test]
    async fn test_define_and_list() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Alias.execute(&args(&["ll=ls", "-l"]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(ctx.state.alias("ll"), Some("ls -l"));

        let result = Alias.execute(&[], &mut ctx).await;
        assert_eq!(result.out, "alias ll='ls -l'\n");
    }

    #[tokio::test]
    async fn test_show_unknown() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Alias.execute(&args(&["nope"]), &mut ctx).await;
        assert!(!result.ok());
        assert_eq!(result.err, "nope: not found");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Alias.execute(&args(&["=ls"]), &mut ctx).await;
        assert!(!result.ok());
    }

    #[tokio::test]
    async fn test_unalias() {
        let (mut ctx, _out, _err) = captured_ctx();
        ctx.state.set_alias("ll", "ls -l");
        assert!(Unalias.execute(&args(&["ll"]), &mut ctx).await.ok());
        assert_eq!(ctx.state.alias("ll"), None);

        let result = Unalias.execute(&args(&["ll"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(!Unalias.execute(&[], &mut ctx).await.ok());
    }
}
