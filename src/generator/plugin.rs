//! Plugin repository inspection
//!
//! Finds out which test suites a plugin ships and which PHP version its
//! `plugin.json` requires. Anything missing simply means "not found".

use regex_lite::Regex;
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

/// Directories a plugin may keep its tests in
pub const TEST_DIRS: &[&str] = &["tests", "Test"];

/// Test suites found in a plugin repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PluginTestSuites {
    /// Any `*Test.php`
    pub php: bool,
    /// Any `*_spec.js`
    pub ui: bool,
    /// A `javascript/index.php` runner
    pub javascript: bool,
}

impl PluginTestSuites {
    pub fn detect(repo_root: &Path) -> Self {
        let test_dirs: Vec<_> = TEST_DIRS.iter().map(|d| repo_root.join(d)).collect();

        Self {
            php: test_dirs
                .iter()
                .any(|dir| folder_contains(dir, |name| name.ends_with("Test.php"))),
            ui: test_dirs
                .iter()
                .any(|dir| folder_contains(dir, |name| name.ends_with("_spec.js"))),
            javascript: test_dirs
                .iter()
                .any(|dir| dir.join("javascript").join("index.php").is_file()),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.php && !self.ui && !self.javascript
    }
}

/// True if any file below `dir` has a name accepted by `matches`.
/// A missing directory contains nothing.
fn folder_contains(dir: &Path, matches: impl Fn(&str) -> bool) -> bool {
    if !dir.is_dir() {
        return false;
    }

    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| matches(&entry.file_name().to_string_lossy()))
}

/// Minimum PHP version from `plugin.json`'s `require.php` (`>=x.y.z`)
pub fn plugin_minimum_php_version(repo_root: &Path) -> Option<String> {
    let path = repo_root.join("plugin.json");
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(_) => {
            info!("No plugin.json file found, cannot detect minimum PHP version.");
            return None;
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(json) => json,
        Err(e) => {
            info!("plugin.json is not valid JSON ({}), cannot detect minimum PHP version.", e);
            return None;
        }
    };

    let Some(requirement) = json
        .get("require")
        .and_then(|r| r.get("php"))
        .and_then(|p| p.as_str())
        .filter(|p| !p.is_empty())
    else {
        info!("No PHP version requirement in plugin.json");
        return None;
    };

    let pattern = Regex::new(r">=\s*([0-9]+\.[0-9]+\.[0-9]+)").expect("valid requirement pattern");
    match pattern.captures(requirement).and_then(|c| c.get(1)) {
        Some(version) => {
            info!("Detected minimum PHP version: '{}'", version.as_str());
            Some(version.as_str().to_string())
        }
        None => {
            info!(
                "Cannot detect minimum php version from php requirement: '{}'",
                requirement
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_detect_nothing_in_empty_repo() {
        let dir = tempfile::tempdir().unwrap();
        let suites = PluginTestSuites::detect(dir.path());
        assert!(suites.is_empty());
    }

    #[test]
    fn test_detect_php_tests_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tests/Integration/Deep/ApiTest.php");

        let suites = PluginTestSuites::detect(dir.path());
        assert!(suites.php);
        assert!(!suites.ui);
        assert!(!suites.javascript);
    }

    #[test]
    fn test_detect_ui_and_js_in_legacy_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Test/UI/Widget_spec.js");
        touch(dir.path(), "Test/javascript/index.php");

        let suites = PluginTestSuites::detect(dir.path());
        assert!(!suites.php);
        assert!(suites.ui);
        assert!(suites.javascript);
    }

    #[test]
    fn test_minimum_php_version_from_plugin_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("plugin.json"),
            r#"{"name": "ExamplePlugin", "require": {"php": ">=5.5.9", "piwik": ">=2.16.0"}}"#,
        )
        .unwrap();

        assert_eq!(plugin_minimum_php_version(dir.path()), Some("5.5.9".to_string()));
    }

    #[test]
    fn test_minimum_php_version_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(plugin_minimum_php_version(dir.path()), None);

        fs::write(dir.path().join("plugin.json"), r#"{"require": {"php": "~7.0"}}"#).unwrap();
        assert_eq!(plugin_minimum_php_version(dir.path()), None);

        fs::write(dir.path().join("plugin.json"), "not json").unwrap();
        assert_eq!(plugin_minimum_php_version(dir.path()), None);
    }
}
