//! Per-session shell state: history, aliases, environment overrides, cwd.
//!
//! Only the main loop touches this (through the kernel's execution context),
//! so none of it is synchronized.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::stage::Stage;

/// Session state owned by the kernel.
#[derive(Debug, Clone)]
pub struct SessionState {
    history: Vec<String>,
    aliases: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
    cwd: PathBuf,
    prev_cwd: Option<PathBuf>,
    exit_request: Option<i32>,
}

impl SessionState {
    /// Fresh state rooted at `cwd`.
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            history: Vec::new(),
            aliases: BTreeMap::new(),
            env: BTreeMap::new(),
            cwd,
            prev_cwd: None,
            exit_request: None,
        }
    }

    /// Append an executed line to history.
    pub fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn set_alias(&mut self, name: impl Into<String>, command: impl Into<String>) {
        self.aliases.insert(name.into(), command.into());
    }

    /// Remove an alias, returning whether it existed.
    pub fn remove_alias(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Aliases sorted by name.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand the first word of a stage if it names an alias. One level only.
    pub fn expand(&self, stage: Stage) -> Stage {
        match self.alias(stage.name()) {
            Some(expansion) => stage.expand_alias(expansion),
            None => stage,
        }
    }

    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    /// Environment overrides applied to every spawned process.
    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// The process environment with session overrides applied, sorted by name.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        vars.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn prev_cwd(&self) -> Option<&Path> {
        self.prev_cwd.as_deref()
    }

    /// Change directory, remembering the old one for `cd -`. Updates `PWD`.
    pub fn set_cwd(&mut self, cwd: PathBuf) {
        let old = std::mem::replace(&mut self.cwd, cwd);
        self.env
            .insert("PWD".to_string(), self.cwd.to_string_lossy().into_owned());
        self.prev_cwd = Some(old);
    }

    /// Resolve a path relative to the session cwd.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Ask the REPL to exit after the current line.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_request = Some(code);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_request.is_some()
    }

    pub fn take_exit_request(&mut self) -> Option<i32> {
        self.exit_request.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_overwrite_by_key() {
        let mut state = SessionState::new(PathBuf::from("/"));
        state.set_alias("ll", "ls -l");
        state.set_alias("ll", "ls -la");
        assert_eq!(state.alias("ll"), Some("ls -la"));
        assert!(state.remove_alias("ll"));
        assert!(!state.remove_alias("ll"));
    }

    #[test]
    fn test_alias_expansion_is_single_level() {
        let mut state = SessionState::new(PathBuf::from("/"));
        state.set_alias("a", "b -x");
        state.set_alias("b", "c");
        let expanded = state.expand(Stage::new("a", ["y"]));
        assert_eq!(expanded, Stage::new("b", ["-x", "y"]));
    }

    #[test]
    fn test_cd_history() {
        let mut state = SessionState::new(PathBuf::from("/tmp"));
        state.set_cwd(PathBuf::from("/usr"));
        assert_eq!(state.cwd(), Path::new("/usr"));
        assert_eq!(state.prev_cwd(), Some(Path::new("/tmp")));
        assert_eq!(state.env_overrides().get("PWD").map(String::as_str), Some("/usr"));
        assert_eq!(state.resolve("bin"), PathBuf::from("/usr/bin"));
        assert_eq!(state.resolve("/etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn test_exit_request_is_taken_once() {
        let mut state = SessionState::new(PathBuf::from("/"));
        state.request_exit(3);
        assert_eq!(state.take_exit_request(), Some(3));
        assert_eq!(state.take_exit_request(), None);
    }
}
