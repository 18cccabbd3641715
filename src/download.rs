// src/download.rs
//
// Downloads the configured asset from a source release: resolve the asset
// name to its numeric id, then an authenticated octet-stream GET against
// the asset endpoint, written to a local staging path.
//
// The asset endpoint serves JSON metadata by default; the
// `Accept: application/octet-stream` header is what switches it to the
// binary payload.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::header;
use thiserror::Error;
use tracing::debug;

use crate::github::{self, ReleaseAsset};

const GITHUB_API: &str = "https://api.github.com";

/// The configured asset name is missing from a source release's assets.
///
/// Distinct from transport failures so the orchestrator's per-release log
/// line names the actual problem.
#[derive(Debug, Error)]
#[error("asset {name:?} not found in source release {release_id}")]
pub struct AssetNotFound {
    pub name: String,
    pub release_id: u64,
}

/// Find an asset by exact file name.
pub fn find_asset<'a>(assets: &'a [ReleaseAsset], name: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.name == name)
}

/// Download `asset_file_name` from the given source release into `dest`.
pub async fn download_asset(
    http: &reqwest::Client,
    token: Option<&str>,
    source_repo: &str,
    release_id: u64,
    asset_file_name: &str,
    dest: &Path,
) -> Result<()> {
    let assets = github::list_assets(source_repo, release_id).await?;
    let asset = find_asset(&assets, asset_file_name).ok_or_else(|| AssetNotFound {
        name: asset_file_name.to_owned(),
        release_id,
    })?;

    let url = format!(
        "{GITHUB_API}/repos/{source_repo}/releases/assets/{}",
        asset.id
    );

    let mut request = http
        .get(&url)
        .header(header::ACCEPT, "application/octet-stream");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("HTTP GET failed for asset {}", asset.id))?
        .error_for_status()
        .with_context(|| format!("Asset download returned error status for {url}"))?;

    let bytes = response
        .bytes()
        .await
        .context("Failed to read asset download body")?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create staging directory {}", parent.display()))?;
    }
    tokio::fs::write(dest, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    debug!(bytes = bytes.len(), dest = %dest.display(), "downloaded asset");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
