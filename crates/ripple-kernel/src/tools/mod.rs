//! Builtin commands for ripple.
//!
//! A stage whose name is in the [`BuiltinTable`] runs in-process through the
//! [`Builtin`] trait; every other name is spawned as an external process.
//!
//! # Architecture
//!
//! ```text
//! BuiltinTable
//! ├── Session (cd, pwd, alias, unalias, export, env, history, source, exit)
//! ├── Jobs (jobs, fg, bg)
//! └── Misc (echo, help)
//! ```

mod builtin;
mod context;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::ExecContext;
pub use registry::BuiltinTable;
pub use traits::{Builtin, BuiltinSchema};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use tempfile::NamedTempFile;

    use super::{register_builtins, BuiltinTable, ExecContext};
    use crate::scheduler::{JobRegistry, DEFAULT_JOB_OUTPUT_LIMIT};
    use crate::session::SessionState;
    use crate::streams::ShellStreams;

    /// A context whose stdout and stderr land in temp files.
    pub fn captured_ctx() -> (ExecContext, NamedTempFile, NamedTempFile) {
        let out = NamedTempFile::new().unwrap();
        let err = NamedTempFile::new().unwrap();
        let streams = ShellStreams::captured(
            out.as_file().try_clone().unwrap(),
            err.as_file().try_clone().unwrap(),
        );
        let mut builtins = BuiltinTable::new();
        register_builtins(&mut builtins);
        let jobs = JobRegistry::new(streams.clone(), DEFAULT_JOB_OUTPUT_LIMIT);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let ctx = ExecContext::new(
            SessionState::new(cwd),
            streams,
            Arc::new(jobs),
            Arc::new(builtins),
        );
        (ctx, out, err)
    }

    pub fn read(file: &NamedTempFile) -> String {
        std::fs::read_to_string(file.path()).unwrap()
    }

    pub fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }
}
