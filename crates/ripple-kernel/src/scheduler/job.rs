//! Background job registry.
//!
//! Jobs are external processes started with `bg`. Each one gets a waiter task
//! that owns its process handle, waits for it to exit, and then marks the job
//! `Completed` through the registry lock. The job's output pipes may outlive
//! the process (a grandchild can inherit them), so draining them is tracked
//! separately and only `fg` waits for it. Completed jobs stay listed until they
//! are reaped (by `fg`, which refuses them, or `jobs --cleanup`).
//!
//! The table lock is only ever held to read or mutate an entry. Nothing awaits
//! process exit while holding it; callers that want to block on a job clone its
//! exit watch under the lock and wait after releasing it.

use std::collections::HashMap;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::process::Child;
use tokio::sync::{watch, Mutex};

use super::output::{pump, JobOutput};
use crate::error::{ShellError, ShellResult};
use crate::streams::{Channel, ShellStreams};

/// Unique identifier for a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('%').parse().map(JobId)
    }
}

/// How a job's process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited normally with a status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
    /// The wait itself failed.
    WaitFailed(String),
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }

    /// Shell-style status code (128 + signal for signal deaths).
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => *code,
            ExitOutcome::Signaled(sig) => 128 + sig,
            ExitOutcome::WaitFailed(_) => 1,
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ExitOutcome::Signaled(sig);
            }
        }
        ExitOutcome::Exited(1)
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit {}", code),
            ExitOutcome::Signaled(sig) => write!(f, "signal {}", sig),
            ExitOutcome::WaitFailed(msg) => write!(f, "wait failed: {}", msg),
        }
    }
}

/// Status of a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Job is currently running.
    Running,
    /// The process has exited.
    Completed(ExitOutcome),
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobStatus::Completed(_))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed(ExitOutcome::Exited(0)) => write!(f, "Completed"),
            JobStatus::Completed(outcome) => write!(f, "Completed ({})", outcome),
        }
    }
}

/// Information about a job for listing.
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub id: JobId,
    /// Command line as invoked.
    pub command: String,
    pub status: JobStatus,
    /// OS process ID, if known.
    pub pid: Option<u32>,
    /// Wall-clock start time.
    pub started: DateTime<Local>,
    /// Time since start.
    pub elapsed: Duration,
}

/// A background job.
struct Job {
    command: String,
    pid: Option<u32>,
    started: DateTime<Local>,
    started_at: Instant,
    status: JobStatus,
    output: Arc<JobOutput>,
    exit: watch::Receiver<Option<ExitOutcome>>,
    drained: watch::Receiver<bool>,
}

impl Job {
    fn info(&self, id: JobId) -> JobInfo {
        JobInfo {
            id,
            command: self.command.clone(),
            status: self.status.clone(),
            pid: self.pid,
            started: self.started,
            elapsed: self.started_at.elapsed(),
        }
    }

    /// Running → Completed, exactly once.
    fn complete(&mut self, outcome: ExitOutcome) {
        if self.status == JobStatus::Running {
            self.status = JobStatus::Completed(outcome);
        }
    }
}

/// A job removed from the registry so it can be waited on in the foreground.
pub struct ForegroundJob {
    pub id: JobId,
    pub command: String,
    output: Arc<JobOutput>,
    exit: watch::Receiver<Option<ExitOutcome>>,
    drained: watch::Receiver<bool>,
}

impl ForegroundJob {
    /// Reattach the job's output to the shell's streams and wait for it to
    /// exit and for its output pipes to reach EOF.
    pub async fn attach_and_wait(mut self) -> ExitOutcome {
        self.output.attach();
        let outcome = wait_for_exit(&mut self.exit).await;
        if self.drained.wait_for(|done| *done).await.is_err() {
            tracing::debug!(job = %self.id, "job output pumps ended without draining");
        }
        outcome
    }
}

async fn wait_for_exit(exit: &mut watch::Receiver<Option<ExitOutcome>>) -> ExitOutcome {
    match exit.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(ExitOutcome::WaitFailed("no result".into())),
        Err(_) => ExitOutcome::WaitFailed("job waiter exited without a result".into()),
    }
}

/// Registry of background jobs.
pub struct JobRegistry {
    /// Counter for generating unique job IDs.
    next_id: AtomicU64,
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
    /// Where attached job output goes.
    streams: ShellStreams,
    /// Detached output retained per job.
    output_limit: usize,
}

impl JobRegistry {
    /// Create an empty registry forwarding attached output to `streams`.
    pub fn new(streams: ShellStreams, output_limit: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            streams,
            output_limit,
        }
    }

    /// Register a started process as a new background job.
    ///
    /// Takes the child's piped stdout/stderr (if any) for buffering and hands
    /// the process handle to a single waiter task.
    pub async fn submit(&self, mut child: Child, command: String) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let pid = child.id();
        let output = Arc::new(JobOutput::new(self.streams.clone(), self.output_limit));

        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(stdout, output.clone(), Channel::Stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(stderr, output.clone(), Channel::Stderr)));
        }

        let (exit_tx, exit_rx) = watch::channel(None);
        let (drained_tx, drained_rx) = watch::channel(false);
        {
            let mut jobs = self.jobs.lock().await;
            jobs.insert(
                id,
                Job {
                    command: command.clone(),
                    pid,
                    started: Local::now(),
                    started_at: Instant::now(),
                    status: JobStatus::Running,
                    output,
                    exit: exit_rx,
                    drained: drained_rx,
                },
            );
        }
        tracing::info!(job = %id, ?pid, %command, "background job started");

        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) => ExitOutcome::from(status),
                Err(e) => ExitOutcome::WaitFailed(e.to_string()),
            };
            tracing::debug!(job = %id, %outcome, "background job finished");
            {
                let mut jobs = jobs.lock().await;
                if let Some(job) = jobs.get_mut(&id) {
                    job.complete(outcome.clone());
                }
            }
            // Receivers may all be gone (job reaped); that's fine.
            let _ = exit_tx.send(Some(outcome));

            for pump in pumps {
                let _ = pump.await;
            }
            let _ = drained_tx.send(true);
        });

        id
    }

    /// Snapshot of all jobs, ordered by id.
    pub async fn list(&self) -> Vec<JobInfo> {
        let jobs = self.jobs.lock().await;
        let mut infos: Vec<JobInfo> = jobs.iter().map(|(id, job)| job.info(*id)).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Get info for a specific job.
    pub async fn get(&self, id: JobId) -> Option<JobInfo> {
        let jobs = self.jobs.lock().await;
        jobs.get(&id).map(|job| job.info(id))
    }

    /// Remove completed jobs from tracking, returning how many were dropped.
    pub async fn cleanup(&self) -> usize {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.status.is_completed());
        before - jobs.len()
    }

    /// Wait for a job to finish without reaping it.
    ///
    /// Returns None for unknown ids.
    pub async fn wait(&self, id: JobId) -> Option<ExitOutcome> {
        let mut exit = {
            let jobs = self.jobs.lock().await;
            jobs.get(&id)?.exit.clone()
        };
        Some(wait_for_exit(&mut exit).await)
    }

    /// Remove a running job from the table so it can be foregrounded.
    ///
    /// Unknown ids and completed jobs are refused and left untouched.
    pub async fn take_for_foreground(&self, id: JobId) -> ShellResult<ForegroundJob> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get(&id) {
            None => return Err(ShellError::UnknownJob(id)),
            Some(job) if job.status.is_completed() => {
                return Err(ShellError::JobAlreadyCompleted(id));
            }
            Some(_) => {}
        }
        let job = jobs.remove(&id).ok_or(ShellError::UnknownJob(id))?;
        Ok(ForegroundJob {
            id,
            command: job.command,
            output: job.output,
            exit: job.exit,
            drained: job.drained,
        })
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(ShellStreams::inherit(), super::output::DEFAULT_JOB_OUTPUT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_sh(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap()
    }

    fn quiet_registry() -> JobRegistry {
        let streams = ShellStreams {
            stdin: crate::streams::StreamTarget::Null,
            stdout: crate::streams::StreamTarget::Null,
            stderr: crate::streams::StreamTarget::Null,
        };
        JobRegistry::new(streams, 1024)
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let registry = quiet_registry();
        let a = registry.submit(spawn_sh("sleep 0.2"), "sleep 0.2".into()).await;
        let b = registry.submit(spawn_sh("exit 0"), "exit 0".into()).await;
        assert_eq!(a, JobId(1));
        assert_eq!(b, JobId(2));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_running() {
        let registry = quiet_registry();
        for _ in 0..3 {
            registry.submit(spawn_sh("sleep 1"), "sleep 1".into()).await;
        }
        let jobs = registry.list().await;
        let ids: Vec<u64> = jobs.iter().map(|j| j.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(jobs.iter().all(|j| j.status == JobStatus::Running));
    }

    #[tokio::test]
    async fn test_waiter_marks_completed_without_removing() {
        let registry = quiet_registry();
        let id = registry.submit(spawn_sh("exit 3"), "exit 3".into()).await;

        let outcome = registry.wait(id).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(3));

        let info = registry.get(id).await.unwrap();
        assert_eq!(info.status, JobStatus::Completed(ExitOutcome::Exited(3)));
        assert_eq!(info.status.to_string(), "Completed (exit 3)");
    }

    #[tokio::test]
    async fn test_take_for_foreground_refusals() {
        let registry = quiet_registry();
        assert!(matches!(
            registry.take_for_foreground(JobId(42)).await,
            Err(ShellError::UnknownJob(JobId(42)))
        ));

        let id = registry.submit(spawn_sh("true"), "true".into()).await;
        registry.wait(id).await;
        assert!(matches!(
            registry.take_for_foreground(id).await,
            Err(ShellError::JobAlreadyCompleted(_))
        ));
        // Refusal leaves the job listed.
        assert!(registry.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_take_for_foreground_removes_before_wait() {
        let registry = quiet_registry();
        let id = registry.submit(spawn_sh("sleep 0.2; exit 4"), "job".into()).await;

        let job = registry.take_for_foreground(id).await.unwrap();
        assert!(registry.get(id).await.is_none());
        assert_eq!(job.attach_and_wait().await, ExitOutcome::Exited(4));
        // Waiter finishing after removal must not resurrect the entry.
        assert!(registry.list().await.is_empty());
    }

    /// A background grandchild keeps the job's stdout open after the job's
    /// own process has exited.
    fn spawn_leaving_grandchild() -> Child {
        spawn_sh("sleep 3 & exit 0")
    }

    #[tokio::test]
    async fn test_completion_tracks_process_exit_not_pipe_eof() {
        let registry = quiet_registry();
        let id = registry.submit(spawn_leaving_grandchild(), "lingering".into()).await;

        let started = Instant::now();
        let outcome = tokio::time::timeout(Duration::from_secs(2), registry.wait(id))
            .await
            .expect("job exit held up by its output pipes");
        assert_eq!(outcome, Some(ExitOutcome::Exited(0)));
        assert!(started.elapsed() < Duration::from_secs(2));

        let info = registry.get(id).await.unwrap();
        assert_eq!(info.status, JobStatus::Completed(ExitOutcome::Exited(0)));

        // fg must refuse it without blocking on the grandchild.
        let refused = tokio::time::timeout(
            Duration::from_millis(500),
            registry.take_for_foreground(id),
        )
        .await
        .unwrap();
        assert!(matches!(refused, Err(ShellError::JobAlreadyCompleted(_))));
    }

    #[tokio::test]
    async fn test_foreground_drains_output_after_exit() {
        let registry = quiet_registry();
        let id = registry
            .submit(spawn_sh("(sleep 0.3; echo late) & sleep 0.1"), "job".into())
            .await;
        let job = registry.take_for_foreground(id).await.unwrap();

        let started = Instant::now();
        assert_eq!(job.attach_and_wait().await, ExitOutcome::Exited(0));
        // Returned only after the grandchild released the pipe.
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_cleanup_keeps_running_jobs() {
        let registry = quiet_registry();
        let done = registry.submit(spawn_sh("true"), "true".into()).await;
        registry.submit(spawn_sh("sleep 5"), "sleep 5".into()).await;
        registry.wait(done).await;

        assert_eq!(registry.cleanup().await, 1);
        let remaining = registry.list().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].command, "sleep 5");
    }

    #[test]
    fn test_job_id_parse() {
        assert_eq!("3".parse::<JobId>().unwrap(), JobId(3));
        assert_eq!("%5".parse::<JobId>().unwrap(), JobId(5));
        assert!("x".parse::<JobId>().is_err());
    }
}
