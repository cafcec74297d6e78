//! jobs: List and manage background jobs.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::ExecResult;
use crate::scheduler::JobInfo;
use crate::tools::{Builtin, BuiltinSchema, ExecContext};

const HEADERS: [&str; 5] = ["ID", "Command", "Status", "Started", "Runtime"];

/// Jobs builtin: list and manage background jobs.
pub struct Jobs;

#[async_trait]
impl Builtin for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("jobs", "List background jobs")
            .usage("jobs [--cleanup]")
            .example("List background jobs", "jobs")
            .example("Clean up completed jobs", "jobs --cleanup")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        // Handle --cleanup flag
        if args.iter().any(|a| a == "--cleanup") {
            let removed = ctx.jobs.cleanup().await;
            return ExecResult::success(format!("Cleaned up {} completed job(s)\n", removed));
        }
        if let Some(other) = args.first() {
            return ExecResult::failure(1, format!("unknown option: {}", other));
        }

        let jobs = ctx.jobs.list().await;
        if jobs.is_empty() {
            return ExecResult::success("No background jobs running.\n");
        }
        ExecResult::success(render_table(&jobs))
    }
}

fn render_table(jobs: &[JobInfo]) -> String {
    let rows: Vec<[String; 5]> = jobs
        .iter()
        .map(|job| {
            [
                job.id.to_string(),
                job.command.clone(),
                job.status.to_string(),
                job.started.format("%Y-%m-%d %H:%M:%S").to_string(),
                format_runtime(job.elapsed),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell.as_ref(), width = *width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Whole seconds, in the `1h2m3s` style.
fn format_runtime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}
