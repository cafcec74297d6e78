//! ripple REPL: interactive front end for the ripple kernel.
//!
//! This REPL reads lines with rustyline and hands them to the kernel one at
//! a time. It handles:
//! - Command execution via the Kernel
//! - Error reporting as a single `ripple: ...` line
//! - Ctrl-C at the prompt and while a command runs (via the signal coordinator)
//! - Command history via rustyline, persisted between sessions

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use ripple_kernel::signals::listen_os_signals;
use ripple_kernel::{
    Kernel, KernelConfig, PromptSink, ShellError, SignalCoordinator, INTERRUPT_NOTICE,
};

/// Exit status after SIGTERM.
pub const TERMINATED_EXIT_CODE: i32 = 143;

/// What became of one line of input.
#[derive(Debug)]
pub enum LineOutcome {
    /// Ran to completion (or was blank).
    Done,
    /// Failed; the REPL reports it and carries on.
    Failed(ShellError),
    /// Ctrl-C arrived while the line was running.
    Interrupted,
    /// `exit` was requested with this status.
    Exit(i32),
}

/// REPL state: the kernel, the runtime it runs on, and the interrupt slot
/// shared with the signal task.
pub struct Repl {
    kernel: Kernel,
    runtime: Runtime,
    coordinator: SignalCoordinator,
}

impl Repl {
    /// Create a REPL on the terminal, configured from the environment.
    pub fn new() -> Result<Self> {
        Self::with_config(KernelConfig::repl())
    }

    /// Create a new REPL with a custom kernel configuration.
    pub fn with_config(config: KernelConfig) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        let kernel = Kernel::new(config);
        Ok(Self {
            kernel,
            runtime,
            coordinator: SignalCoordinator::new(),
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// The interrupt slot shared with the signal task.
    pub fn coordinator(&self) -> &SignalCoordinator {
        &self.coordinator
    }

    /// Run one line to completion.
    pub fn process_line(&self, line: &str) -> LineOutcome {
        let guard = self.coordinator.begin();
        let result = self.runtime.block_on(self.kernel.execute(line));
        let interrupted = guard.finish();

        if let Some(code) = self.runtime.block_on(self.kernel.take_exit_request()) {
            return LineOutcome::Exit(code);
        }
        if interrupted {
            if let Err(e) = result {
                tracing::debug!("interrupted command: {}", e);
            }
            return LineOutcome::Interrupted;
        }
        match result {
            Ok(()) => LineOutcome::Done,
            Err(e) => LineOutcome::Failed(e),
        }
    }

    /// Format an error the way the shell reports it.
    pub fn error_line(&self, err: &ShellError) -> String {
        format!("{}: {}", self.kernel.name(), err)
    }

    /// Start forwarding OS signals to the coordinator.
    fn start_signal_handling(&self, sink: Arc<dyn PromptSink>) -> Result<()> {
        let _enter = self.runtime.enter();
        let (tx, rx) = mpsc::unbounded_channel();
        listen_os_signals(tx).context("Failed to install signal handlers")?;
        self.coordinator.clone().spawn(rx, sink);
        Ok(())
    }
}

/// Prints the interrupt notice and prompt for signals that arrive while the
/// REPL is idle; exits on SIGTERM.
struct TerminalPrompt {
    prompt: String,
}

impl PromptSink for TerminalPrompt {
    fn interrupted_at_prompt(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\n{}\n{}", INTERRUPT_NOTICE, self.prompt);
        let _ = out.flush();
    }

    fn terminated(&self) {
        tracing::info!("exiting on SIGTERM");
        std::process::exit(TERMINATED_EXIT_CODE);
    }
}

/// Default history file: `<data dir>/ripple/history.txt`.
pub fn default_history_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("ripple").join("history.txt"))
}

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
                return;
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the interactive REPL. Returns the shell's exit status.
pub fn run() -> Result<i32> {
    println!("ripple v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for builtins, 'exit' to quit.");

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;

    // Load history if it exists
    let history_path = default_history_path();
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Only log if it's not a "file not found" error (expected on first run)
            let is_not_found = matches!(
                &e,
                ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
            );
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let repl = Repl::new()?;
    let prompt = repl.kernel().prompt().to_string();
    repl.start_signal_handling(Arc::new(TerminalPrompt {
        prompt: prompt.clone(),
    }))?;

    let code = loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match repl.process_line(&line) {
                    LineOutcome::Done => {}
                    LineOutcome::Failed(e) => eprintln!("{}", repl.error_line(&e)),
                    LineOutcome::Interrupted => println!(),
                    LineOutcome::Exit(code) => break code,
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C at the prompt: the line editor swallowed it.
                println!("{}", INTERRUPT_NOTICE);
                continue;
            }
            Err(ReadlineError::Eof) => {
                break 0;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break 1;
            }
        }
    };

    // Save history
    save_history(&mut rl, &history_path);

    Ok(code)
}

/// Execute a single line and return its exit status.
pub fn run_command(line: &str) -> Result<i32> {
    let repl = Repl::new()?;
    Ok(match repl.process_line(line) {
        LineOutcome::Done => 0,
        LineOutcome::Failed(e) => {
            eprintln!("{}", repl.error_line(&e));
            e.code()
        }
        LineOutcome::Interrupted => 130,
        LineOutcome::Exit(code) => code,
    })
}
