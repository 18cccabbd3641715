// src/patch.rs
//
// The patch transform is an external collaborator: an executable that
// reads the original asset and writes the patched artifact.  Nothing about
// its internals matters here beyond the argv contract
// `{patch_tool} {input} {output}` and a zero exit on success.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::process;

/// Run the external patch transform on `input`, producing `output`.
pub async fn patch_file(patch_tool: &str, input: &Path, output: &Path) -> Result<()> {
    let input_arg = input.to_string_lossy();
    let output_arg = output.to_string_lossy();

    process::run(&[patch_tool, &*input_arg, &*output_arg])
        .await
        .with_context(|| format!("Patch transform failed for {}", input.display()))?;

    if !output.exists() {
        bail!(
            "Patch tool exited cleanly but produced no file at {}",
            output.display()
        );
    }

    debug!(output = %output.display(), "patched asset staged");
    Ok(())
}
