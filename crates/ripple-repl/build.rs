//! Build script for ripple-repl: stamps `--version` with the source revision
//! and build date.
//!
//! Packagers building outside a git checkout can set `RIPPLE_GIT_HASH`
//! themselves.

use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo::rerun-if-env-changed=RIPPLE_GIT_HASH");
    let git_dir = Path::new("../../.git");
    if git_dir.exists() {
        println!("cargo::rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo::rerun-if-changed={}", git_dir.join("refs/heads").display());
    }

    let revision = std::env::var("RIPPLE_GIT_HASH")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(describe_head)
        .unwrap_or_else(|| "unknown".to_string());
    let build_date = chrono::Utc::now().date_naive();

    println!("cargo:rustc-env=RIPPLE_GIT_HASH={revision}");
    println!("cargo:rustc-env=RIPPLE_BUILD_DATE={build_date}");
}

fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
