//! Interrupt and termination handling.
//!
//! The shell never dies from SIGINT. What it does depends on whether a
//! foreground command is running:
//!
//! - **Idle** (at the prompt): print a notice and the prompt once.
//! - **Running**: the terminal already delivered the signal to the child, so
//!   print nothing and just remember it; the main loop resynchronises its
//!   prompt when the command returns.
//!
//! The main loop and the signal task share one atomic slot. Every decision is
//! a single atomic operation on it, so for any one interrupt exactly one side
//! acts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Notice printed when Ctrl-C arrives at the prompt.
pub const INTERRUPT_NOTICE: &str = "CTRL-C detected. Use 'exit' to quit the shell.";

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const INTERRUPTED: u8 = 2;

/// A signal the shell reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSignal {
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

/// What the coordinator did with an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Shell was idle; the prompt was reprinted.
    Reprompted,
    /// A foreground command owns the interrupt.
    Deferred,
}

/// The REPL side of signal handling.
pub trait PromptSink: Send + Sync {
    /// Print the interrupt notice and a fresh prompt.
    fn interrupted_at_prompt(&self);

    /// SIGTERM received. Default teardown only; background jobs may outlive
    /// the shell.
    fn terminated(&self);
}

/// Shared foreground state between the main loop and the signal task.
#[derive(Debug, Clone, Default)]
pub struct SignalCoordinator {
    state: Arc<AtomicU8>,
}

impl SignalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a foreground command as running until the guard is finished or
    /// dropped.
    pub fn begin(&self) -> RunningGuard {
        self.state.store(RUNNING, Ordering::SeqCst);
        RunningGuard {
            state: self.state.clone(),
        }
    }

    /// True when no foreground command is running.
    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::SeqCst) == IDLE
    }

    /// React to one interrupt.
    pub fn handle_interrupt(&self, sink: &dyn PromptSink) -> InterruptAction {
        match self
            .state
            .compare_exchange(RUNNING, INTERRUPTED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                tracing::debug!("interrupt deferred to foreground command");
                InterruptAction::Deferred
            }
            Err(INTERRUPTED) => InterruptAction::Deferred,
            Err(_) => {
                sink.interrupted_at_prompt();
                InterruptAction::Reprompted
            }
        }
    }

    /// Handle signals from `signals` until the channel closes.
    pub fn spawn(
        self,
        mut signals: mpsc::UnboundedReceiver<ShellSignal>,
        sink: Arc<dyn PromptSink>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                tracing::debug!(?signal, "signal received");
                match signal {
                    ShellSignal::Interrupt => {
                        self.handle_interrupt(sink.as_ref());
                    }
                    ShellSignal::Terminate => {
                        tracing::info!("terminate signal received");
                        sink.terminated();
                        break;
                    }
                }
            }
        })
    }
}

/// Held by the main loop while a foreground command runs.
#[derive(Debug)]
pub struct RunningGuard {
    state: Arc<AtomicU8>,
}

impl RunningGuard {
    /// Return to idle, reporting whether an interrupt arrived meanwhile.
    pub fn finish(self) -> bool {
        self.state.swap(IDLE, Ordering::SeqCst) == INTERRUPTED
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.state.store(IDLE, Ordering::SeqCst);
    }
}

/// Forward the process's SIGINT and SIGTERM into `tx`.
#[cfg(unix)]
pub fn listen_os_signals(
    tx: mpsc::UnboundedSender<ShellSignal>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => ShellSignal::Interrupt,
                Some(()) = terminate.recv() => ShellSignal::Terminate,
                else => break,
            };
            if tx.send(received).is_err() {
                break;
            }
        }
    }))
}

/// Forward Ctrl-C into `tx`.
#[cfg(not(unix))]
pub fn listen_os_signals(
    tx: mpsc::UnboundedSender<ShellSignal>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ShellSignal::Interrupt).is_err() {
                break;
            }
        }
    }))
}
