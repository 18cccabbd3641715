// src/output.rs
//
// Run results for the downstream automation step (the announcement job),
// written as line-oriented `key=value` pairs to the path named by
// `GITHUB_OUTPUT`.  The file is appended to, never truncated: other steps
// of the same workflow write their outputs to the same file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::mirror::RunResult;

/// Sink used when `GITHUB_OUTPUT` is unset.
pub const DEFAULT_OUTPUT_PATH: &str = "/dev/null";

/// Render the `key=value` lines for one run.
///
/// `version` and `urls` are only present when something was mirrored.
pub fn render_outputs(result: &RunResult) -> Result<String> {
    if !result.found_any() {
        return Ok("new_releases_found=false\n".to_owned());
    }

    let version = result
        .primary_version()
        .context("mirrored releases but no version was recorded")?;
    let urls =
        serde_json::to_string(&result.urls_by_app).context("Failed to encode download URLs")?;

    Ok(format!(
        "new_releases_found=true\nversion={version}\nurls={urls}\n"
    ))
}

/// Append this run's outputs to `path`.
pub fn write_outputs(path: &Path, result: &RunResult) -> Result<()> {
    let lines = render_outputs(result)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output sink {}", path.display()))?;
    file.write_all(lines.as_bytes())
        .with_context(|| format!("Failed to write outputs to {}", path.display()))?;

    info!(path = %path.display(), found = result.found_any(), "wrote run outputs");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
