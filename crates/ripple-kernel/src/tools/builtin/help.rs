//! help: Describe the builtins.

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Help builtin: list builtins, or show one in detail.
pub struct Help;

#[async_trait]
impl Builtin for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("help", "Show help for builtin commands").usage("help [builtin]")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        match args.first() {
            None => ExecResult::success(overview(&ctx.builtins.schemas())),
            Some(name) => match ctx.builtins.get(name) {
                Some(builtin) => ExecResult::success(detail(&builtin.schema())),
                None => ExecResult::failure(1, format!("{}: not a builtin", name)),
            },
        }
    }
}

fn overview(schemas: &[BuiltinSchema]) -> String {
    let width = schemas.iter().map(|s| s.usage.len()).max().unwrap_or(0);
    let mut out = String::from("Builtin commands (anything else runs as an external program):\n\n");
    for schema in schemas {
        out.push_str(&format!("  {:width$}  {}\n", schema.usage, schema.description));
    }
    out
}

fn detail(schema: &BuiltinSchema) -> String {
    let mut out = format!("{}\n\n  {}\n", schema.usage, schema.description);
    if !schema.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for (description, command) in &schema.examples {
            out.push_str(&format!("  {:24}  # {}\n", command, description));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, captured_ctx};

    #[tokio::test]
    async fn test_overview_lists_every_builtin() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Help.execute(&[], &mut ctx).await;
        assert!(result.ok());
        for name in ctx.builtins.names() {
            assert!(result.out.contains(name), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_detail() {
        let (mut ctx, _out, _err) = captured_ctx();
        let result = Help.execute(&args(&["fg"]), &mut ctx).await;
        assert!(result.out.starts_with("fg <id>\n"));
        assert!(result.out.contains("fg 2"));

        let result = Help.execute(&args(&["ls"]), &mut ctx).await;
        assert_eq!(result.err, "ls: not a builtin");
    }
}
