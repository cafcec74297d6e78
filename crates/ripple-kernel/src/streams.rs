//! The shell's own standard streams.
//!
//! External stages inherit these directly (no copying through the shell),
//! builtins write their text to them, and background jobs forward their
//! output to them once brought to the foreground. The REPL inherits the
//! terminal; tests point stdout/stderr at files.

use std::fs::File;
use std::io::{self, Write};
use std::process::Stdio;
use std::sync::Arc;

/// Where one of the shell's streams points.
#[derive(Debug, Clone, Default)]
pub enum StreamTarget {
    /// The process's own stream (the terminal, for the REPL).
    #[default]
    Inherit,
    /// Discard output / empty input.
    Null,
    /// A file. Child processes receive a duplicate of the descriptor.
    File(Arc<File>),
}

impl StreamTarget {
    /// Wrap an open file.
    pub fn file(file: File) -> Self {
        StreamTarget::File(Arc::new(file))
    }

    /// A `Stdio` suitable for handing to a child process.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            StreamTarget::Inherit => Stdio::inherit(),
            StreamTarget::Null => Stdio::null(),
            StreamTarget::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

/// Which output stream a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

/// The shell's stdin, stdout and stderr.
#[derive(Debug, Clone, Default)]
pub struct ShellStreams {
    pub stdin: StreamTarget,
    pub stdout: StreamTarget,
    pub stderr: StreamTarget,
}

impl ShellStreams {
    /// Streams connected to the terminal.
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Null stdin with stdout and stderr going to the given files.
    pub fn captured(stdout: File, stderr: File) -> Self {
        Self {
            stdin: StreamTarget::Null,
            stdout: StreamTarget::file(stdout),
            stderr: StreamTarget::file(stderr),
        }
    }

    /// Write raw bytes to stdout or stderr.
    pub fn write(&self, channel: Channel, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let target = match channel {
            Channel::Stdout => &self.stdout,
            Channel::Stderr => &self.stderr,
        };
        match target {
            StreamTarget::Inherit => match channel {
                Channel::Stdout => {
                    let mut out = io::stdout().lock();
                    out.write_all(bytes)?;
                    out.flush()
                }
                Channel::Stderr => {
                    let mut err = io::stderr().lock();
                    err.write_all(bytes)?;
                    err.flush()
                }
            },
            StreamTarget::Null => Ok(()),
            StreamTarget::File(file) => {
                let mut file: &File = file;
                file.write_all(bytes)
            }
        }
    }

    /// Write text to stdout.
    pub fn print(&self, text: &str) -> io::Result<()> {
        self.write(Channel::Stdout, text.as_bytes())
    }

    /// Write text to stderr.
    pub fn eprint(&self, text: &str) -> io::Result<()> {
        self.write(Channel::Stderr, text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target_receives_writes() {
        let out = tempfile::NamedTempFile::new().unwrap();
        let err = tempfile::NamedTempFile::new().unwrap();
        let streams = ShellStreams::captured(
            out.as_file().try_clone().unwrap(),
            err.as_file().try_clone().unwrap(),
        );

        streams.print("one\n").unwrap();
        streams.eprint("oops\n").unwrap();
        streams.print("two\n").unwrap();

        assert_eq!(std::fs::read_to_string(out.path()).unwrap(), "one\ntwo\n");
        assert_eq!(std::fs::read_to_string(err.path()).unwrap(), "oops\n");
    }

    #[test]
    fn test_null_discards() {
        let streams = ShellStreams {
            stdin: StreamTarget::Null,
            stdout: StreamTarget::Null,
            stderr: StreamTarget::Null,
        };
        streams.print("ignored").unwrap();
        assert!(streams.stdout.stdio().is_ok());
    }
}
