// src/parse.rs
//
// Classifies a release's free-text body as pertaining to zero or one
// configured app and extracts the version string.
//
// Release bodies are arbitrary prose; the only stable marker across
// releases is the infix "for <displayName> v<version>", so matching is a
// case-insensitive substring search, not full-string anchoring.  The scan
// is first-match-wins over the configured app order: no attempt is made to
// find a "best" match or to flag descriptions mentioning several apps.

use regex::Regex;
use tracing::info;

use crate::config::App;

/// A release body successfully matched to a configured app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMatch {
    pub app_id: String,
    pub version: String,
}

/// Find the first configured app whose "for <displayName> v<version>"
/// pattern appears in `description`.
///
/// Never fails: a body with no recognizable pattern yields `None`.
pub fn parse_release_description(description: &str, apps: &[App]) -> Option<ParsedMatch> {
    for app in apps {
        let pattern = format!(r"(?i)for {} v([0-9.]+)", regex::escape(&app.display_name));
        // Cannot fail on an escaped display name; skip the app if it somehow does.
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };

        if let Some(captures) = re.captures(description) {
            let version = captures[1].to_owned();
            info!(app = %app.id, version = %version, "matched release description");
            return Some(ParsedMatch {
                app_id: app.id.clone(),
                version,
            });
        }
    }

    None
}

// ─── Tests ────────────────────────────────────────────────────────────────────
