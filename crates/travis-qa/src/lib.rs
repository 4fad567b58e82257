//! Quality checks for plugin repositories.
//!
//! Inspects a plugin checkout (tests, screenshots, `plugin.json`, file
//! headers) and reports one finding per check instead of stopping at the
//! first problem.

mod checks;
mod files;
mod policy;
mod report;

pub use checks::CHECKS;
pub use files::{is_ui_file, PluginFiles};
pub use policy::{field_matches, Publisher, CLOSED_SOURCE_HEADER, OPEN_SOURCE_HEADER};
pub use report::{CheckStatus, Finding, QaReport, QA_REPORT_SCHEMA_ID};

use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Setup errors; failed checks are findings, not errors
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("Cannot find plugin directory at '{0}'")]
    MissingPluginDir(PathBuf),

    #[error("plugin.json does not exist in '{0}'")]
    MissingManifest(PathBuf),

    #[error("plugin.json is either empty or invalid JSON: {0}")]
    InvalidManifest(String),

    #[error("Repository slug must look like 'owner/repo', got '{0}'")]
    InvalidRepoSlug(String),

    #[error("Cannot list plugin files: {0}")]
    Walk(String),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

/// What to check
#[derive(Debug, Clone)]
pub struct QaOptions {
    pub plugin_dir: PathBuf,
    pub plugin_name: String,
    /// `owner/repo`
    pub repo_slug: String,
    /// Repository description the `plugin.json` description must equal
    pub expected_description: Option<String>,
}

/// A loaded plugin, ready to be checked
#[derive(Debug)]
pub struct PluginQa {
    options: QaOptions,
    files: PluginFiles,
    manifest: Value,
    publisher: Publisher,
}

impl PluginQa {
    pub fn new(options: QaOptions) -> Result<Self, QaError> {
        if !options.plugin_dir.is_dir() {
            return Err(QaError::MissingPluginDir(options.plugin_dir));
        }

        let mut slug = options.repo_slug.splitn(2, '/');
        let (owner, repo) = (slug.next().unwrap_or_default(), slug.next().unwrap_or_default());
        if owner.is_empty() || repo.is_empty() {
            return Err(QaError::InvalidRepoSlug(options.repo_slug));
        }
        let publisher = Publisher::from_slug(&options.repo_slug);

        let manifest_path = options.plugin_dir.join("plugin.json");
        let contents = fs::read_to_string(&manifest_path)
            .map_err(|_| QaError::MissingManifest(options.plugin_dir.clone()))?;
        let manifest: Value = serde_json::from_str(&contents)
            .map_err(|e| QaError::InvalidManifest(e.to_string()))?;
        if manifest.as_object().map_or(true, |m| m.is_empty()) {
            return Err(QaError::InvalidManifest("expected a non-empty object".to_string()));
        }

        let files = PluginFiles::scan(&options.plugin_dir)?;

        Ok(Self {
            options,
            files,
            manifest,
            publisher,
        })
    }

    pub fn options(&self) -> &QaOptions {
        &self.options
    }

    pub fn files(&self) -> &PluginFiles {
        &self.files
    }

    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher
    }

    /// Run every check
    pub fn run(&self) -> QaReport {
        let findings = CHECKS.iter().map(|(_, check)| check(self)).collect();
        QaReport::new(&self.options.plugin_name, findings)
    }
}
