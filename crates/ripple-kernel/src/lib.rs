//! ripple-kernel: the pipeline execution and job-control engine of the
//! ripple shell.
//!
//! This crate provides:
//!
//! - **Stages**: Splitting a command line on `|` into stage descriptors
//! - **Tools**: The builtin trait, dispatch table, and builtin commands
//! - **Scheduler**: OS-pipe pipeline execution and background job management
//! - **Signals**: Coordinating SIGINT/SIGTERM with the foreground command
//! - **Kernel**: The engine facade the REPL drives, one line at a time

pub mod error;
pub mod kernel;
pub mod result;
pub mod scheduler;
pub mod session;
pub mod signals;
pub mod stage;
pub mod streams;
pub mod tools;

pub use error::{ShellError, ShellResult};
pub use kernel::{Kernel, KernelConfig, DEFAULT_PROMPT};
pub use result::ExecResult;
pub use scheduler::{ExitOutcome, JobId, JobInfo, JobStatus, OrphanPolicy};
pub use signals::{PromptSink, ShellSignal, SignalCoordinator, INTERRUPT_NOTICE};
pub use stage::{parse_pipeline, Pipeline, Stage};
pub use streams::{ShellStreams, StreamTarget};
