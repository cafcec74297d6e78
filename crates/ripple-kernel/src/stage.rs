//! Stage descriptors and the pipe-splitting stage parser.
//!
//! A line like `ls -l | grep rs | sort` becomes three stages. There is no
//! quoting or expansion: segments are split on `|`, trimmed, and split on
//! whitespace. Empty segments are dropped.

use std::fmt;

/// Delimiter between pipeline stages.
pub const PIPE: char = '|';

/// One command within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    name: String,
    args: Vec<String>,
}

/// An ordered chain of stages.
pub type Pipeline = Vec<Stage>;

impl Stage {
    /// Create a stage from a command name and its arguments.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one pipe-free segment. Returns None for blank input.
    pub fn parse(segment: &str) -> Option<Self> {
        let mut words = segment.split_whitespace();
        let name = words.next()?;
        Some(Self::new(name, words))
    }

    /// The command name (argv[0]).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Replace the command name with an alias expansion.
    ///
    /// The expansion's own words come first, followed by this stage's args.
    /// A blank expansion leaves the stage untouched.
    pub fn expand_alias(&self, expansion: &str) -> Self {
        match Stage::parse(expansion) {
            Some(mut expanded) => {
                expanded.args.extend(self.args.iter().cloned());
                expanded
            }
            None => self.clone(),
        }
    }

    /// The stage as the user would type it.
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Split a raw line into pipeline stages.
///
/// An all-blank line (or one made only of pipes) yields an empty pipeline.
pub fn parse_pipeline(line: &str) -> Pipeline {
    line.split(PIPE).filter_map(Stage::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let stages = parse_pipeline("ls -la /tmp");
        assert_eq!(stages, vec![Stage::new("ls", ["-la", "/tmp"])]);
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let stages = parse_pipeline(" | echo a || wc -l | ");
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name(), "echo");
        assert_eq!(stages[1].args(), ["-l"]);
    }

    #[test]
    fn test_no_args() {
        let stage = Stage::parse("  date ").unwrap();
        assert_eq!(stage.name(), "date");
        assert!(stage.args().is_empty());
    }

    #[test]
    fn test_expand_alias() {
        let stage = Stage::new("ll", ["/tmp"]);
        let expanded = stage.expand_alias("ls -l");
        assert_eq!(expanded, Stage::new("ls", ["-l", "/tmp"]));
        assert_eq!(stage.expand_alias("   "), stage);
    }

    #[test]
    fn test_command_line() {
        assert_eq!(Stage::new("grep", ["-i", "x"]).command_line(), "grep -i x");
        assert_eq!(Stage::new("true", Vec::<String>::new()).command_line(), "true");
    }
}
