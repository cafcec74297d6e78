//! ripple CLI entry point.
//!
//! Usage:
//!   ripple                      # Interactive REPL
//!   ripple -c <command>         # Execute command and exit

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    match args.get(1).map(|s| s.as_str()) {
        None => {
            // No args: interactive REPL
            let code = ripple_repl::run()?;
            Ok(exit_code(code))
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!(
                "ripple {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("RIPPLE_GIT_HASH"),
                env!("RIPPLE_BUILD_DATE")
            );
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let cmd = args.get(2).context("-c requires a command argument")?;
            let code = ripple_repl::run_command(cmd)?;
            Ok(exit_code(code))
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'ripple --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Shell statuses wrap into a byte, as they do for any process.
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from((code & 0xff) as u8)
}

fn print_help() {
    println!(r#"ripple v{}

Usage:
  ripple                       Interactive REPL
  ripple -c <command>          Execute command line and exit

Options:
  -c <command>                 Execute command line and exit
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  RIPPLE_PROMPT                Prompt string (default: "ripple> ")
  RIPPLE_ORPHAN_POLICY         leave | kill: stages already started when a
                               later pipeline stage fails to start
  RUST_LOG                     Log filter (e.g. ripple_kernel=debug)

Examples:
  ripple                       # Start interactive shell
  ripple -c 'ls | wc -l'       # Run a pipeline
"#, env!("CARGO_PKG_VERSION"));
}
