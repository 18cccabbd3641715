// src/mirror.rs
//
// The mirror pass: iterate the source repository's recent releases, match
// each body against the configured apps, and for every match not yet
// present in the bot repository run download → patch → publish.
//
// Idempotency rests entirely on the bot repository itself: a release tag
// `{app_id}-v{version}` existing there means that pair was already
// mirrored.  There is no local database.
//
// Failure isolation: anything that goes wrong mirroring one release is
// logged with its source tag and app id and the loop moves on.  Only the
// initial release-list fetch is fatal to the pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::{App, Config};
use crate::download::download_asset;
use crate::github::{self, ReleaseStatus, SourceRelease};
use crate::parse::parse_release_description;
use crate::patch::patch_file;

/// The app whose version headlines the downstream announcement when it was
/// mirrored this run.
const HEADLINE_APP_ID: &str = "bitlife";

// ─── Run context and result ───────────────────────────────────────────────────

/// Everything a mirror pass needs, assembled once in `main`.  No component
/// below this level reads the process environment.
pub struct RunContext {
    pub config: Config,
    pub github_token: Option<String>,
    pub http: reqwest::Client,
}

/// Accumulated outcome of one pass, written to the output sink at the end.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Bot-repository download URL per mirrored app id.
    pub urls_by_app: BTreeMap<String, String>,
    headline_version: Option<String>,
    last_version: Option<String>,
}

impl RunResult {
    /// Record one successfully mirrored release.
    pub fn record(&mut self, app_id: &str, version: &str, url: String) {
        if app_id == HEADLINE_APP_ID {
            self.headline_version = Some(version.to_owned());
        }
        self.last_version = Some(version.to_owned());
        self.urls_by_app.insert(app_id.to_owned(), url);
    }

    /// Whether anything was mirrored this run.
    pub fn found_any(&self) -> bool {
        !self.urls_by_app.is_empty()
    }

    /// The version reported downstream: the headline app's version when it
    /// was mirrored this run, otherwise the last mirrored version.
    pub fn primary_version(&self) -> Option<&str> {
        self.headline_version
            .as_deref()
            .or(self.last_version.as_deref())
    }

    fn used_fallback(&self) -> bool {
        self.headline_version.is_none() && self.last_version.is_some()
    }
}

// ─── Deterministic release naming ─────────────────────────────────────────────

/// Bot-repository tag for a mirrored `(app, version)` pair.
pub fn release_tag(app_id: &str, version: &str) -> String {
    format!("{app_id}-v{version}")
}

pub fn release_title(app: &App, asset_file_name: &str, version: &str) -> String {
    format!("{} {} v{}", app.display_name, asset_file_name, version)
}

pub fn release_notes(app: &App, asset_file_name: &str, source_tag: &str) -> String {
    format!(
        "Patched {} for {}.\n\nMirrored from source release `{}`.",
        asset_file_name, app.display_name, source_tag
    )
}

/// Download URL the published asset will be served from.  Constructed, not
/// read back from the API: the path is fully determined by repo, tag, and
/// file name.
pub fn bot_download_url(bot_repo: &str, tag: &str, asset_file_name: &str) -> String {
    format!("https://github.com/{bot_repo}/releases/download/{tag}/{asset_file_name}")
}

// ─── The pass ─────────────────────────────────────────────────────────────────

/// Run one complete mirror pass and return the accumulated result.
pub async fn run_mirror_pass(ctx: &RunContext) -> Result<RunResult> {
    let config = &ctx.config;
    let releases = github::list_releases(&config.github.source_repo).await?;

    info!(
        count = releases.len(),
        repo = %config.github.source_repo,
        "scanning source releases"
    );

    let staging = staging_dir();
    let mut result = RunResult::default();
    let mut failures = 0usize;

    for release in &releases {
        let Some(body) = release.body.as_deref().filter(|b| !b.trim().is_empty()) else {
            continue;
        };
        let Some(parsed) = parse_release_description(body, &config.apps) else {
            continue;
        };
        // The parser only returns ids taken from the config, but the lookup
        // is re-verified before any external work starts.
        let Some(app) = config.app_by_id(&parsed.app_id) else {
            debug!(app = %parsed.app_id, "matched app id is not configured, skipping");
            continue;
        };

        let tag = release_tag(&app.id, &parsed.version);

        match github::release_status(&config.github.bot_repo, &tag).await {
            ReleaseStatus::Found => {
                info!(%tag, "release already exists, skipping");
                continue;
            }
            ReleaseStatus::NotFound => {
                info!(%tag, "release does not exist, proceeding");
            }
            ReleaseStatus::TransportError(message) => {
                // Cannot tell whether the tag exists; publishing anyway
                // could break the idempotency contract, so this release is
                // treated like any other per-release failure.
                error!(
                    %tag,
                    source_tag = %release.tag_name,
                    error = %message,
                    "existence check failed, skipping release"
                );
                failures += 1;
                continue;
            }
        }

        match mirror_release(ctx, release, app, &parsed.version, &tag, &staging).await {
            Ok(url) => {
                info!(%tag, app = %app.id, version = %parsed.version, url = %url, "mirrored release");
                result.record(&app.id, &parsed.version, url);
            }
            Err(e) => {
                error!(
                    source_tag = %release.tag_name,
                    app = %app.id,
                    error = %format!("{e:#}"),
                    "failed to mirror release"
                );
                failures += 1;
            }
        }
    }

    if result.used_fallback() {
        warn!(
            version = ?result.primary_version(),
            "headline app was not mirrored this run, reporting last mirrored version"
        );
    }

    info!(
        scanned = releases.len(),
        mirrored = result.urls_by_app.len(),
        failures,
        "mirror pass complete"
    );

    Ok(result)
}

/// Mirror a single matched release: download the source asset, patch it,
/// publish the patched file in the bot repository.  Returns the published
/// asset's download URL.
async fn mirror_release(
    ctx: &RunContext,
    release: &SourceRelease,
    app: &App,
    version: &str,
    tag: &str,
    staging: &Path,
) -> Result<String> {
    let config = &ctx.config;
    let asset_file_name = &config.github.asset_file_name;

    // The patched file is staged under the configured asset name so the
    // published attachment uploads under the exact name clients expect.
    let work_dir = staging.join(tag);
    let original = work_dir.join(format!("{asset_file_name}.orig"));
    let patched = work_dir.join(asset_file_name);

    download_asset(
        &ctx.http,
        ctx.github_token.as_deref(),
        &config.github.source_repo,
        release.id,
        asset_file_name,
        &original,
    )
    .await?;

    patch_file(&config.patch_tool, &original, &patched).await?;

    github::create_release(
        &config.github.bot_repo,
        tag,
        &release_title(app, asset_file_name, version),
        &release_notes(app, asset_file_name, &release.tag_name),
        &patched.to_string_lossy(),
    )
    .await?;

    Ok(bot_download_url(&config.github.bot_repo, tag, asset_file_name))
}

/// Per-process staging directory for downloads and patched artifacts.
fn staging_dir() -> PathBuf {
    std::env::temp_dir().join(format!("release-mirror-{}", std::process::id()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str, display_name: &str) -> App {
        App {
            id: id.to_owned(),
            display_name: display_name.to_owned(),
        }
    }

    #[test]
    fn tag_is_deterministic() {
        assert_eq!(release_tag("bitlife", "3.19.4"), "bitlife-v3.19.4");
        assert_eq!(release_tag("bitlife", "3.19.4"), release_tag("bitlife", "3.19.4"));
        assert_ne!(release_tag("bitlife", "1.0"), release_tag("doglife", "1.0"));
    }

    #[test]
    fn title_names_app_asset_and_version() {
        let title = release_title(&app("bitlife", "BitLife"), "MonetizationVars", "3.19.4");
        assert_eq!(title, "BitLife MonetizationVars v3.19.4");
    }

    #[test]
    fn notes_reference_asset_app_and_source_tag() {
        let notes = release_notes(&app("bitlife", "BitLife"), "MonetizationVars", "update-77");
        assert!(notes.contains("MonetizationVars"));
        assert!(notes.contains("BitLife"));
        assert!(notes.contains("update-77"));
    }

    #[test]
    fn download_url_is_constructed_not_fetched() {
        let url = bot_download_url("mirror/bot", "bitlife-v3.19.4", "MonetizationVars");
        assert_eq!(
            url,
            "https://github.com/mirror/bot/releases/download/bitlife-v3.19.4/MonetizationVars"
        );
    }

    #[test]
    fn headline_app_version_wins_regardless_of_order() {
        let mut result = RunResult::default();
        result.record("bitlife", "1.0.0", "url1".to_owned());
        result.record("otherapp", "2.0.0", "url2".to_owned());

        assert_eq!(result.primary_version(), Some("1.0.0"));
        assert_eq!(result.urls_by_app.len(), 2);
        assert_eq!(result.urls_by_app["bitlife"], "url1");
        assert_eq!(result.urls_by_app["otherapp"], "url2");
    }

    #[test]
    fn headline_app_wins_even_when_processed_first() {
        let mut result = RunResult::default();
        result.record("otherapp", "2.0.0", "url2".to_owned());
        result.record("bitlife", "1.0.0", "url1".to_owned());

        assert_eq!(result.primary_version(), Some("1.0.0"));
    }

    #[test]
    fn fallback_is_last_mirrored_version() {
        // Caveat: when the headline app was not mirrored, the reported
        // version is simply the last one processed, not the highest.
        let mut result = RunResult::default();
        result.record("otherapp", "2.0.0", "url2".to_owned());
        result.record("thirdapp", "1.5.0", "url3".to_owned());

        assert!(result.used_fallback());
        assert_eq!(result.primary_version(), Some("1.5.0"));
    }

    #[test]
    fn empty_run_has_no_version() {
        let result = RunResult::default();
        assert!(!result.found_any());
        assert!(!result.used_fallback());
        assert_eq!(result.primary_version(), None);
    }
}
