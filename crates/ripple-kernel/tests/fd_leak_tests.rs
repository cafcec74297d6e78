//! Descriptor hygiene when a pipeline aborts part-way through starting.
//!
//! Kept in its own test binary: it counts the whole process's open
//! descriptors, so nothing else may run concurrently.

#![cfg(target_os = "linux")]

use std::time::{Duration, Instant};

use ripple_kernel::{Kernel, KernelConfig, ShellError, ShellStreams, StreamTarget};

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[tokio::test]
async fn failed_middle_stage_leaks_no_descriptors() {
    let kernel = Kernel::new(KernelConfig::default().with_streams(ShellStreams {
        stdin: StreamTarget::Null,
        stdout: StreamTarget::Null,
        stderr: StreamTarget::Null,
    }));

    // Warm up: the runtime's child-reaping machinery opens descriptors the
    // first time a process is spawned.
    kernel.execute("echo warm | cat | wc -c").await.unwrap();
    let baseline = open_fds();

    let err = kernel
        .execute("printf hello | definitely_not_a_command_4242 | wc -l")
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::StageStartFailure { stage: 1, .. }));

    // The orphaned first stage is reaped by a detached task; give it a moment.
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut now_open = open_fds();
    while now_open > baseline && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
        now_open = open_fds();
    }
    assert!(
        now_open <= baseline,
        "descriptors leaked: {} open before, {} after",
        baseline,
        now_open
    );
}
