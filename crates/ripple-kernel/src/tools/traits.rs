//! Core builtin traits and types.

use async_trait::async_trait;

use crate::result::ExecResult;

use super::context::ExecContext;

/// Schema describing a builtin's interface, used by `help`.
#[derive(Debug, Clone)]
pub struct BuiltinSchema {
    /// Builtin name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Usage line, e.g. `fg <id>`.
    pub usage: String,
    /// Example invocations with descriptions.
    pub examples: Vec<(String, String)>,
}

impl BuiltinSchema {
    /// Create a new builtin schema. Usage defaults to the bare name.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            description: description.into(),
            examples: Vec::new(),
        }
    }

    /// Set the usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Add an example.
    pub fn example(mut self, description: impl Into<String>, command: impl Into<String>) -> Self {
        self.examples.push((description.into(), command.into()));
        self
    }
}

/// A command run inside the shell process instead of as a child process.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// The builtin's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the builtin's schema.
    fn schema(&self) -> BuiltinSchema;

    /// Execute with the stage's arguments (argv without the name).
    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult;
}
