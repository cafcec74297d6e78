//! The Kernel: the heart of ripple.
//!
//! The Kernel owns and coordinates the engine's components:
//! - Session state (history, aliases, environment overrides, cwd)
//! - Builtin table
//! - Pipeline runner
//! - Job registry (background jobs)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Kernel                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ SessionState │  │ BuiltinTable │  │  PipelineRunner  │  │
//! │  │ (history,    │  │ (cd, jobs,   │  │  (OS pipes,      │  │
//! │  │  aliases)    │  │  fg, bg ...) │  │   orphan policy) │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘  │
//! │  ┌──────────────────────────────┐  ┌──────────────────┐    │
//! │  │  JobRegistry (background)    │  │  ShellStreams    │    │
//! │  └──────────────────────────────┘  └──────────────────┘    │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{ShellError, ShellResult};
use crate::scheduler::{
    control, JobId, JobInfo, JobRegistry, OrphanPolicy, PipelineRunner, DEFAULT_JOB_OUTPUT_LIMIT,
};
use crate::session::SessionState;
use crate::stage::{parse_pipeline, Pipeline};
use crate::streams::ShellStreams;
use crate::tools::{register_builtins, BuiltinTable, ExecContext};

/// Default prompt.
pub const DEFAULT_PROMPT: &str = "ripple> ";

/// How deep `source` may nest before lines are refused.
const MAX_SOURCE_DEPTH: usize = 64;

/// Configuration for kernel initialization.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Name of this shell; prefixes error messages.
    pub name: String,

    /// Prompt shown by the REPL.
    pub prompt: String,

    /// Initial working directory.
    pub cwd: PathBuf,

    /// What to do with already-started stages when a later one fails to start.
    pub orphan_policy: OrphanPolicy,

    /// Bytes of background job output retained while the job is detached.
    pub job_output_limit: usize,

    /// Where the shell's own stdin/stdout/stderr point.
    pub streams: ShellStreams,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "ripple".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
            orphan_policy: OrphanPolicy::default(),
            job_output_limit: DEFAULT_JOB_OUTPUT_LIMIT,
            streams: ShellStreams::inherit(),
        }
    }
}

impl KernelConfig {
    /// Create a REPL config: terminal streams, settings from the environment.
    pub fn repl() -> Self {
        Self::from_env()
    }

    /// Defaults overridden by `RIPPLE_PROMPT` and `RIPPLE_ORPHAN_POLICY`.
    ///
    /// An unparseable orphan policy is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(prompt) = std::env::var("RIPPLE_PROMPT") {
            config.prompt = prompt;
        }
        if let Ok(policy) = std::env::var("RIPPLE_ORPHAN_POLICY") {
            match policy.parse() {
                Ok(policy) => config.orphan_policy = policy,
                Err(e) => tracing::warn!("ignoring RIPPLE_ORPHAN_POLICY: {}", e),
            }
        }
        config
    }

    /// Set the shell name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the initial working directory.
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = cwd;
        self
    }

    /// Set the orphan policy.
    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// Set the detached output limit per background job.
    pub fn with_job_output_limit(mut self, limit: usize) -> Self {
        self.job_output_limit = limit;
        self
    }

    /// Point the shell's streams somewhere other than the terminal.
    pub fn with_streams(mut self, streams: ShellStreams) -> Self {
        self.streams = streams;
        self
    }
}

/// The Kernel: executes ripple command lines.
///
/// Lines run strictly one at a time: `execute` holds the execution context
/// for the whole line, including any lines it sources.
pub struct Kernel {
    /// Shell name.
    name: String,
    /// Prompt for the REPL.
    prompt: String,
    /// Background jobs.
    jobs: Arc<JobRegistry>,
    /// Pipeline runner.
    runner: PipelineRunner,
    /// Execution context (session state, streams).
    exec_ctx: Mutex<ExecContext>,
}

impl Kernel {
    /// Create a new kernel with the given configuration.
    pub fn new(config: KernelConfig) -> Self {
        let mut builtins = BuiltinTable::new();
        register_builtins(&mut builtins);
        let builtins = Arc::new(builtins);

        let jobs = Arc::new(JobRegistry::new(
            config.streams.clone(),
            config.job_output_limit,
        ));
        let runner = PipelineRunner::new(builtins.clone(), config.orphan_policy);
        let exec_ctx = ExecContext::new(
            SessionState::new(config.cwd),
            config.streams,
            jobs.clone(),
            builtins,
        );

        tracing::debug!(
            name = %config.name,
            orphan_policy = ?config.orphan_policy,
            "kernel created"
        );
        Self {
            name: config.name,
            prompt: config.prompt,
            jobs,
            runner,
            exec_ctx: Mutex::new(exec_ctx),
        }
    }

    /// Get the kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Execute one command line.
    ///
    /// Blank lines are a no-op. The line is recorded in history, aliases are
    /// expanded, and the resulting pipeline runs to completion. Lines queued by
    /// `source` run afterwards; their failures are written to stderr and do not
    /// affect the result.
    pub async fn execute(&self, line: &str) -> ShellResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let mut ctx = self.exec_ctx.lock().await;
        ctx.state.record(line);
        let result = self.run_line(line, &mut ctx).await;
        self.run_sourced(&mut ctx).await;
        result
    }

    async fn run_line(&self, line: &str, ctx: &mut ExecContext) -> ShellResult<()> {
        let stages: Pipeline = parse_pipeline(line)
            .into_iter()
            .map(|stage| ctx.state.expand(stage))
            .collect();
        tracing::debug!(stages = stages.len(), %line, "executing");
        self.runner.run(&stages, ctx).await
    }

    /// Drain lines queued by `source`. A nested `source` runs its file before
    /// the rest of the outer one.
    async fn run_sourced(&self, ctx: &mut ExecContext) {
        let mut queue: VecDeque<(usize, String)> =
            ctx.take_pending().into_iter().map(|line| (1, line)).collect();

        while let Some((depth, line)) = queue.pop_front() {
            if ctx.state.exit_requested() {
                break;
            }
            if depth > MAX_SOURCE_DEPTH {
                self.report(ctx, &ShellError::Usage(format!(
                    "source: nesting deeper than {} levels, skipping: {}",
                    MAX_SOURCE_DEPTH, line
                )));
                continue;
            }
            if let Err(e) = self.run_line(&line, ctx).await {
                self.report(ctx, &e);
            }
            for nested in ctx.take_pending().into_iter().rev() {
                queue.push_front((depth + 1, nested));
            }
        }
    }

    fn report(&self, ctx: &ExecContext, err: &ShellError) {
        if let Err(e) = ctx.streams.eprint(&format!("{}: {}\n", self.name, err)) {
            tracing::warn!("failed to report error: {}", e);
        }
    }

    /// Snapshot of background jobs, ordered by id.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.list().await
    }

    /// Bring a background job to the foreground and wait for it.
    pub async fn foreground(&self, id: JobId) -> ShellResult<()> {
        let ctx = self.exec_ctx.lock().await;
        control::foreground(id, &ctx).await
    }

    /// Start a single command (no pipes) as a background job.
    pub async fn background(&self, line: &str) -> ShellResult<JobId> {
        let ctx = self.exec_ctx.lock().await;
        let mut stages = parse_pipeline(line);
        let stage = match stages.len() {
            0 => return Err(ShellError::Usage("bg: requires a command".to_string())),
            1 => ctx.state.expand(stages.remove(0)),
            _ => {
                return Err(ShellError::Usage(
                    "bg: pipelines cannot be sent to the background".to_string(),
                ));
            }
        };
        control::background(&stage, &ctx).await
    }

    /// The exit code requested by the `exit` builtin, if any. Taken once.
    pub async fn take_exit_request(&self) -> Option<i32> {
        self.exec_ctx.lock().await.state.take_exit_request()
    }

    /// Executed lines, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.exec_ctx.lock().await.state.history().to_vec()
    }

    /// Get the job registry.
    pub fn jobs(&self) -> Arc<JobRegistry> {
        self.jobs.clone()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}
