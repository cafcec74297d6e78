//! The builtin dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::{Builtin, BuiltinSchema};

/// Maps command names to in-process handlers. Anything not in the table is
/// run as an external process.
#[derive(Default)]
pub struct BuiltinTable {
    builtins: HashMap<String, Arc<dyn Builtin>>,
}

impl BuiltinTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builtin, replacing any previous one with the same name.
    pub fn register<B: Builtin + 'static>(&mut self, builtin: B) {
        self.builtins
            .insert(builtin.name().to_string(), Arc::new(builtin));
    }

    /// Look up a builtin by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.builtins.get(name).cloned()
    }

    /// True if `name` is dispatched in-process.
    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Schemas of every builtin, sorted by name.
    pub fn schemas(&self) -> Vec<BuiltinSchema> {
        let mut schemas: Vec<BuiltinSchema> = self.builtins.values().map(|b| b.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}

impl std::fmt::Debug for BuiltinTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinTable")
            .field("builtins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::register_builtins;

    #[test]
    fn test_registered_builtins() {
        let mut table = BuiltinTable::new();
        register_builtins(&mut table);
        for name in ["cd", "echo", "exit", "fg", "bg", "jobs", "source"] {
            assert!(table.contains(name), "missing {name}");
        }
        assert!(!table.contains("ls"));
        assert!(table.get("grep").is_none());
    }

    #[test]
    fn test_names_sorted() {
        let mut table = BuiltinTable::new();
        register_builtins(&mut table);
        let names = table.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(table.schemas().len(), names.len());
    }
}
