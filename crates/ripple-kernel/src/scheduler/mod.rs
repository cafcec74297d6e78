//! Scheduler module for ripple: pipelines and background jobs.
//!
//! This module provides:
//! - **Pipeline execution**: Run commands connected by OS pipes, where stdout
//!   of one process is the stdin of the next.
//! - **Background jobs**: Start commands with `bg`, track them, and bring
//!   them back with `fg`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PipelineRunner                          │
//! │  ┌─────────┐  OS pipe   ┌─────────┐  OS pipe   ┌─────────┐  │
//! │  │ stage 0 │───────────▶│ stage 1 │───────────▶│ stage 2 │  │
//! │  │ (spawn) │   stdout   │ (spawn) │   stdout   │ (spawn) │  │
//! │  └─────────┘            └─────────┘            └─────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      JobRegistry                            │
//! │  jobs: HashMap<JobId, Job>                                  │
//! │  - submit(child) → JobId        (control::background)       │
//! │  - take_for_foreground(JobId)   (control::foreground)       │
//! │  - list() → Vec<JobInfo>                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod control;
mod job;
mod output;
mod pipeline;

pub use job::{ExitOutcome, ForegroundJob, JobId, JobInfo, JobRegistry, JobStatus};
pub use output::{JobOutput, DEFAULT_JOB_OUTPUT_LIMIT};
pub use pipeline::{OrphanPolicy, PipelineRunner};
