// src/process.rs
//
// `run`:           spawn an external command, capture stdout, error on
//                  non-zero exit with stderr in the message.
// `run_unchecked`: same capture, but hand the raw outcome back to the
//                  caller, for call sites where a non-zero exit is an
//                  answer rather than a failure (the existence check).
//
// Commands are argv vectors, never `sh -c` strings: every invocation here
// carries caller-supplied values (tags, repo names, file paths) and none
// of them needs shell features.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Captured outcome of an external command.
#[derive(Debug)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Execute `argv`, capturing output.  Spawn failures (binary missing,
/// permission denied) are errors; the child's own exit status is not.
/// Inspect [`CommandOutput::success`].
pub async fn run_unchecked(argv: &[&str]) -> Result<CommandOutput> {
    let (prog, args) = argv
        .split_first()
        .context("Empty command line")?;

    debug!(command = %argv.join(" "), "running external command");

    let output = Command::new(prog)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to spawn: {prog}"))?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Execute `argv` and return its trimmed stdout.
///
/// Returns `Err` on spawn failure or non-zero exit; the error message
/// carries the command and whatever the child wrote to stderr.
pub async fn run(argv: &[&str]) -> Result<String> {
    let output = run_unchecked(argv).await?;

    if !output.success() {
        let code = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_owned());
        bail!(
            "Command failed (exit {code}): {}\n{}",
            argv.join(" "),
            output.stderr.trim()
        );
    }

    Ok(output.stdout.trim().to_owned())
}
