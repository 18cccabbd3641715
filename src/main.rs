// src/main.rs
//
// release-mirror entry point.  A short-lived batch job: load config, snapshot the environment, run one
// mirror pass, write the outputs.  Config-load and release-list failures
// terminate the process with a non-zero exit; everything narrower is
// handled inside the pass.

mod config;
mod download;
mod github;
mod mirror;
mod output;
mod parse;
mod patch;
mod process;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::mirror::RunContext;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(Path::new(config::CONFIG_PATH))?;

    // The environment is read once, here; the pass itself only sees the
    // context object.
    let github_token = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
    if github_token.is_none() {
        warn!("GITHUB_TOKEN is not set; asset downloads will be unauthenticated");
    }
    let output_path = std::env::var("GITHUB_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(output::DEFAULT_OUTPUT_PATH));

    let http = reqwest::Client::builder()
        .user_agent(concat!("release-mirror/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let ctx = RunContext {
        config,
        github_token,
        http,
    };

    let result = mirror::run_mirror_pass(&ctx).await?;
    output::write_outputs(&output_path, &result)?;

    Ok(())
}
