//! Platform versions a plugin declares it works with
//!
//! `plugin.json` lists its constraints as `require.piwik` (or
//! `require.matomo`), e.g. `">=2.16.0,<3.0.0-b1"`. They decide which platform
//! version a plugin build is tested against and whether that version is
//! recent enough.

use regex_lite::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use super::versions::compare_versions;

/// Used when no version can be worked out offline
pub const FALLBACK_VERSION: &str = "master";

#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("No plugin.json found at {0}")]
    MissingManifest(PathBuf),

    #[error("Invalid plugin.json at {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },
}

/// One `<comparison><version>` entry of a constraint list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredVersion {
    pub comparison: String,
    pub version: String,
}

impl RequiredVersion {
    /// Sets a lower bound (`>=`, `>`, `==`)
    pub fn is_lower_bound(&self) -> bool {
        matches!(self.comparison.as_str(), ">=" | ">" | "==")
    }

    /// Sets an upper bound (`<`, `<=`, `==`)
    pub fn is_upper_bound(&self) -> bool {
        matches!(self.comparison.as_str(), "<" | "<=" | "==")
    }

    /// Version number without any leading non-digit characters (`v2.0` -> `2.0`)
    pub fn number(&self) -> &str {
        self.version.trim_start_matches(|c: char| !c.is_ascii_digit())
    }

    /// `<N.0.0-b1`, i.e. "anything before the next major release"
    fn is_next_major_bound(&self) -> bool {
        self.comparison == "<" && next_major_pattern().is_match(&self.version)
    }
}

impl std::fmt::Display for RequiredVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.comparison, self.version)
    }
}

fn constraint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(<>|!=|>=?|<=?|==?)\s*(.*)$").expect("valid constraint pattern")
    })
}

fn next_major_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+\.0\.0-b1$").expect("valid major beta pattern"))
}

/// Parsed `plugin.json` of the plugin checked out at `plugin_dir`
pub fn read_manifest(plugin_dir: &Path) -> Result<Value, RequirementError> {
    let path = plugin_dir.join("plugin.json");
    let contents =
        fs::read_to_string(&path).map_err(|_| RequirementError::MissingManifest(path.clone()))?;

    serde_json::from_str(&contents).map_err(|e| RequirementError::InvalidManifest {
        path,
        reason: e.to_string(),
    })
}

/// Constraints declared in `require.piwik`, else `require.matomo`.
///
/// With `tested_version`, constraints on versions newer than it are skipped.
pub fn required_versions(manifest: &Value, tested_version: Option<&str>) -> Vec<RequiredVersion> {
    let require = manifest.get("require");
    let declared = require
        .and_then(|r| r.get("piwik"))
        .or_else(|| require.and_then(|r| r.get("matomo")));

    let list = match declared {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => other.to_string(),
    };

    list.split(',')
        .filter_map(|entry| {
            let captures = constraint_pattern().captures(entry.trim())?;
            let required = RequiredVersion {
                comparison: captures.get(1)?.as_str().trim().to_string(),
                version: captures.get(2)?.as_str().trim().to_string(),
            };
            if required.number().is_empty() {
                return None;
            }
            if let Some(tested) = tested_version {
                if compare_versions(&required.version, tested) == Ordering::Greater {
                    return None;
                }
            }
            Some(required)
        })
        .collect()
}

/// Lowest lower bound
pub fn minimum_required(required: &[RequiredVersion]) -> Option<&str> {
    required
        .iter()
        .filter(|r| r.is_lower_bound())
        .map(|r| r.version.as_str())
        .min_by(|a, b| compare_versions(a, b))
}

/// Highest upper bound. `None` when there is none, or when a bound only
/// names the next major release (its latest beta cannot be known offline).
pub fn maximum_required(required: &[RequiredVersion]) -> Option<&str> {
    if required.iter().any(RequiredVersion::is_next_major_bound) {
        info!("Latest beta before the next major release is not known offline.");
        return None;
    }

    required
        .iter()
        .filter(|r| r.is_upper_bound())
        .map(|r| r.version.as_str())
        .max_by(|a, b| compare_versions(a, b))
}

/// Platform version a plugin build should be tested against
pub fn required_version(manifest: &Value, tested_version: Option<&str>, max: bool) -> String {
    let required = required_versions(manifest, tested_version);
    let version = if max {
        maximum_required(&required)
    } else {
        minimum_required(&required)
    };

    match version {
        Some(version) => version.to_string(),
        None => {
            info!("No usable platform version requirement, using '{}'.", FALLBACK_VERSION);
            FALLBACK_VERSION.to_string()
        }
    }
}

/// Outcome of checking one constraint against the tested version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibility {
    pub required: RequiredVersion,
    pub compatible: bool,
}

/// Check every constraint of a plugin against the version it is tested with.
/// A constraint fails when its version is newer than `tested_version`.
pub fn check_compatible(manifest: &Value, tested_version: &str) -> Vec<Compatibility> {
    required_versions(manifest, None)
        .into_iter()
        .filter(|r| r.is_lower_bound())
        .map(|required| Compatibility {
            compatible: compare_versions(tested_version, required.number()) != Ordering::Less,
            required,
        })
        .collect()
}
