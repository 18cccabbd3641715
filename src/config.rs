// src/config.rs
//
// Static JSON configuration: which source repository to watch, which bot
// repository to publish into, the asset file name to mirror, and the list
// of recognized apps.  Loaded once at startup and read-only afterwards.
//
// Validation happens here, at the boundary, so the rest of the program can
// assume a well-formed config: non-empty repository identifiers and asset
// name, non-empty unique app ids.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Default location of the configuration file, relative to the working
/// directory the job is launched from.
pub const CONFIG_PATH: &str = "config.json";

fn default_patch_tool() -> String {
    "patch-tool".to_owned()
}

// ─── Config shape ─────────────────────────────────────────────────────────────

/// One app the mirror recognizes in source release descriptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Unique key, used in tags and in the run output (e.g. `"bitlife"`).
    pub id: String,
    /// Human-readable name as it appears in release bodies (e.g. `"BitLife"`).
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubConfig {
    /// `owner/name` of the repository whose releases are watched.
    pub source_repo: String,
    /// `owner/name` of the repository patched assets are republished into.
    pub bot_repo: String,
    /// File name of the asset to download, patch, and re-attach.
    pub asset_file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub github: GithubConfig,
    /// Recognized apps, in match-priority order.
    pub apps: Vec<App>,
    /// Executable that performs the patch transform, invoked as
    /// `{patch_tool} {input} {output}`.
    #[serde(default = "default_patch_tool")]
    pub patch_tool: String,
}

// ─── Loading ──────────────────────────────────────────────────────────────────

impl Config {
    /// Load and validate the configuration from `path`.
    ///
    /// A missing or malformed file is fatal for the run; there is no
    /// fallback configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config at {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config at {}", path.display()))?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.github.source_repo.is_empty() {
            bail!("github.sourceRepo is empty");
        }
        if self.github.bot_repo.is_empty() {
            bail!("github.botRepo is empty");
        }
        if self.github.asset_file_name.is_empty() {
            bail!("github.assetFileName is empty");
        }
        if self.patch_tool.is_empty() {
            bail!("patchTool is empty");
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.id.is_empty() {
                bail!("apps entry has an empty id");
            }
            if app.display_name.is_empty() {
                bail!("app {:?} has an empty displayName", app.id);
            }
            if !seen.insert(app.id.as_str()) {
                bail!("duplicate app id {:?}", app.id);
            }
        }

        Ok(())
    }

    /// Look up a configured app by id.
    pub fn app_by_id(&self, id: &str) -> Option<&App> {
        self.apps.iter().find(|app| app.id == id)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "github": {
            "sourceRepo": "upstream/releases",
            "botRepo": "mirror/bot",
            "assetFileName": "MonetizationVars"
        },
        "apps": [
            { "id": "bitlife", "displayName": "BitLife" },
            { "id": "bitlife-go", "displayName": "BitLife Go" }
        ]
    }"#;

    fn parse(json: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn parses_valid_config() {
        let config = parse(VALID).unwrap();
        assert_eq!(config.github.source_repo, "upstream/releases");
        assert_eq!(config.github.bot_repo, "mirror/bot");
        assert_eq!(config.github.asset_file_name, "MonetizationVars");
        assert_eq!(config.apps.len(), 2);
        assert_eq!(config.apps[0].id, "bitlife");
        assert_eq!(config.apps[1].display_name, "BitLife Go");
    }

    #[test]
    fn patch_tool_defaults_when_absent() {
        let config = parse(VALID).unwrap();
        assert_eq!(config.patch_tool, "patch-tool");
    }

    #[test]
    fn patch_tool_can_be_overridden() {
        let json = VALID.replacen('{', r#"{ "patchTool": "./crypto-patch","#, 1);
        let config = parse(&json).unwrap();
        assert_eq!(config.patch_tool, "./crypto-patch");
    }

    #[test]
    fn rejects_duplicate_app_ids() {
        let json = r#"{
            "github": {
                "sourceRepo": "a/b",
                "botRepo": "c/d",
                "assetFileName": "f"
            },
            "apps": [
                { "id": "bitlife", "displayName": "BitLife" },
                { "id": "bitlife", "displayName": "BitLife again" }
            ]
        }"#;
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("duplicate app id"));
    }

    #[test]
    fn rejects_empty_repo() {
        let json = VALID.replace("upstream/releases", "");
        let err = parse(&json).unwrap_err();
        assert!(err.to_string().contains("sourceRepo"));
    }

    #[test]
    fn rejects_missing_github_section() {
        let err = parse(r#"{ "apps": [] }"#).unwrap_err();
        assert!(err.to_string().contains("github"));
    }

    #[test]
    fn app_lookup_by_id() {
        let config = parse(VALID).unwrap();
        assert_eq!(config.app_by_id("bitlife-go").unwrap().display_name, "BitLife Go");
        assert!(config.app_by_id("unknown").is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.apps[0].id, "bitlife");
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
