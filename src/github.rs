// src/github.rs
//
// GitHub data client and release operations, all through the authenticated
// `gh` CLI: list source releases, list a release's assets, check whether a
// tag already exists in the bot repository, and create a release with one
// file attachment.
//
// API responses are deserialized into small typed structs naming only the
// fields this program uses.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::process::{run, run_unchecked, CommandOutput};

/// How many of the most recent source releases one run considers.  Older
/// un-mirrored releases beyond this window are skipped until a later run.
pub const RELEASE_PAGE_SIZE: u32 = 30;

// ─── API response shapes ──────────────────────────────────────────────────────

/// One release of the source repository.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRelease {
    pub id: u64,
    pub tag_name: String,
    /// Free-text release notes; may be absent or empty.
    pub body: Option<String>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// Fetch the most recent releases of `source_repo` (newest first, one page).
pub async fn list_releases(source_repo: &str) -> Result<Vec<SourceRelease>> {
    let path = format!("repos/{source_repo}/releases?per_page={RELEASE_PAGE_SIZE}");
    let json = run(&["gh", "api", path.as_str()])
        .await
        .with_context(|| format!("Failed to fetch releases for {source_repo}"))?;

    let releases: Vec<SourceRelease> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse release JSON for {source_repo}"))?;

    debug!(count = releases.len(), repo = source_repo, "fetched source releases");
    Ok(releases)
}

/// Fetch the assets attached to one source release.
pub async fn list_assets(source_repo: &str, release_id: u64) -> Result<Vec<ReleaseAsset>> {
    let path = format!("repos/{source_repo}/releases/{release_id}/assets");
    let json = run(&["gh", "api", path.as_str()])
        .await
        .with_context(|| format!("Failed to fetch assets for release {release_id}"))?;

    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse asset JSON for release {release_id}"))
}

// ─── Existence check ──────────────────────────────────────────────────────────

/// Outcome of looking up a release tag in the bot repository.
///
/// `NotFound` is the expected common case for a release that has not been
/// mirrored yet: it is an answer, not an error.  `TransportError` covers
/// everything else that can go wrong talking to GitHub (auth, network,
/// a missing repo) and must never be mistaken for "safe to publish".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    Found,
    NotFound,
    TransportError(String),
}

/// Check whether `tag` already exists as a release in `bot_repo`.
pub async fn release_status(bot_repo: &str, tag: &str) -> ReleaseStatus {
    match run_unchecked(&["gh", "release", "view", tag, "--repo", bot_repo]).await {
        Ok(output) => classify_view_outcome(&output),
        Err(e) => ReleaseStatus::TransportError(format!("{e:#}")),
    }
}

/// Map a `gh release view` outcome onto [`ReleaseStatus`].
///
/// `gh` exits non-zero both for a missing release and for transport
/// failures; only a "not found" message on stderr identifies the former.
fn classify_view_outcome(output: &CommandOutput) -> ReleaseStatus {
    if output.success() {
        return ReleaseStatus::Found;
    }
    if output.stderr.to_lowercase().contains("not found") {
        return ReleaseStatus::NotFound;
    }
    ReleaseStatus::TransportError(output.stderr.trim().to_owned())
}

// ─── Publish ──────────────────────────────────────────────────────────────────

/// Create a release tagged `tag` in `bot_repo`, attaching `asset_path`.
///
/// Fails if the tag already exists; callers are expected to have checked
/// [`release_status`] first.
pub async fn create_release(
    bot_repo: &str,
    tag: &str,
    title: &str,
    notes: &str,
    asset_path: &str,
) -> Result<()> {
    run(&[
        "gh", "release", "create", tag,
        "--repo", bot_repo,
        "--title", title,
        "--notes", notes,
        asset_path,
    ])
    .await
    .with_context(|| format!("Failed to create release {tag} in {bot_repo}"))?;

    info!(repo = bot_repo, %tag, "published release");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_list_json() {
        let json = r#"[
            { "id": 101, "tag_name": "update-77", "body": "MonetizationVars for BitLife v3.19.4", "html_url": "ignored" },
            { "id": 100, "tag_name": "update-76", "body": null }
        ]"#;
        let releases: Vec<SourceRelease> = serde_json::from_str(json).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].id, 101);
        assert_eq!(releases[0].tag_name, "update-77");
        assert!(releases[0].body.as_deref().unwrap().contains("BitLife"));
        assert!(releases[1].body.is_none());
    }

    #[test]
    fn parses_asset_list_json() {
        let json = r#"[
            { "id": 9001, "name": "MonetizationVars", "size": 4096 },
            { "id": 9002, "name": "readme.txt" }
        ]"#;
        let assets: Vec<ReleaseAsset> = serde_json::from_str(json).unwrap();
        assert_eq!(assets[0].id, 9001);
        assert_eq!(assets[1].name, "readme.txt");
    }

    fn outcome(code: Option<i32>, stderr: &str) -> CommandOutput {
        CommandOutput {
            code,
            stdout: String::new(),
            stderr: stderr.to_owned(),
        }
    }

    #[test]
    fn zero_exit_is_found() {
        let status = classify_view_outcome(&outcome(Some(0), ""));
        assert_eq!(status, ReleaseStatus::Found);
    }

    #[test]
    fn not_found_stderr_is_not_found() {
        let status = classify_view_outcome(&outcome(Some(1), "release not found"));
        assert_eq!(status, ReleaseStatus::NotFound);

        let status = classify_view_outcome(&outcome(Some(1), "HTTP 404: Not Found"));
        assert_eq!(status, ReleaseStatus::NotFound);
    }

    #[test]
    fn other_failures_are_transport_errors() {
        let status = classify_view_outcome(&outcome(Some(1), "HTTP 401: Bad credentials"));
        assert_eq!(
            status,
            ReleaseStatus::TransportError("HTTP 401: Bad credentials".to_owned())
        );

        let status = classify_view_outcome(&outcome(None, ""));
        assert!(matches!(status, ReleaseStatus::TransportError(_)));
    }
}
