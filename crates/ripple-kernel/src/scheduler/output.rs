//! Output routing for background jobs.
//!
//! A background job's stdout and stderr are pumped by small tasks into a
//! `JobOutput`. While the job is detached the bytes are held in a bounded
//! buffer (oldest chunks evicted first); `attach` flushes that buffer to the
//! shell's streams and forwards everything after it live.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::streams::{Channel, ShellStreams};

/// Default number of detached output bytes retained per job (1 MiB).
pub const DEFAULT_JOB_OUTPUT_LIMIT: usize = 1024 * 1024;

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Default)]
struct OutputState {
    attached: bool,
    pending: VecDeque<(Channel, Vec<u8>)>,
    pending_bytes: usize,
    dropped_bytes: usize,
}

/// Captured or forwarded output of one background job.
#[derive(Debug)]
pub struct JobOutput {
    streams: ShellStreams,
    limit: usize,
    state: Mutex<OutputState>,
}

impl JobOutput {
    /// Create a detached output sink that retains at most `limit` bytes.
    pub fn new(streams: ShellStreams, limit: usize) -> Self {
        Self {
            streams,
            limit,
            state: Mutex::new(OutputState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutputState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Route one chunk: forward if attached, otherwise buffer.
    pub fn deliver(&self, channel: Channel, bytes: &[u8]) {
        let mut state = self.lock();
        if state.attached {
            if let Err(e) = self.streams.write(channel, bytes) {
                tracing::warn!("failed to forward job output: {}", e);
            }
            return;
        }

        state.pending.push_back((channel, bytes.to_vec()));
        state.pending_bytes += bytes.len();
        while state.pending_bytes > self.limit {
            match state.pending.pop_front() {
                Some((_, evicted)) => {
                    state.pending_bytes -= evicted.len();
                    state.dropped_bytes += evicted.len();
                }
                None => break,
            }
        }
    }

    /// Flush buffered output to the shell's streams and forward from now on.
    pub fn attach(&self) {
        let mut state = self.lock();
        if state.dropped_bytes > 0 {
            let note = format!("[{} bytes of earlier output discarded]\n", state.dropped_bytes);
            let _ = self.streams.eprint(&note);
            state.dropped_bytes = 0;
        }
        while let Some((channel, bytes)) = state.pending.pop_front() {
            if let Err(e) = self.streams.write(channel, &bytes) {
                tracing::warn!("failed to flush job output: {}", e);
            }
        }
        state.pending_bytes = 0;
        state.attached = true;
    }
}

/// Copy a child's stream into `output` until EOF.
pub async fn pump<R>(mut reader: R, output: std::sync::Arc<JobOutput>, channel: Channel)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => output.deliver(channel, &buf[..n]),
            Err(e) => {
                tracing::debug!("job output stream closed: {}", e);
                break;
            }
        }
    }
}
