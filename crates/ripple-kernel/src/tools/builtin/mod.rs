//! Built-in commands for ripple.
//!
//! These run inside the shell process. Their `ExecResult.out` goes to the
//! shell's stdout, or to the next stage when the builtin heads a pipeline.

mod alias;
mod bg;
mod cd;
mod echo;
mod env;
mod exit;
mod fg;
mod help;
mod history;
mod jobs;
mod pwd;
mod source;

use super::BuiltinTable;

/// Register all builtins with the table.
pub fn register_builtins(table: &mut BuiltinTable) {
    table.register(alias::Alias);
    table.register(alias::Unalias);
    table.register(bg::Bg);
    table.register(cd::Cd);
    table.register(echo::Echo);
    table.register(env::Env);
    table.register(env::Export);
    table.register(exit::Exit);
    table.register(fg::Fg);
    table.register(help::Help);
    table.register(history::History);
    table.register(jobs::Jobs);
    table.register(pwd::Pwd);
    table.register(source::Source);
}
