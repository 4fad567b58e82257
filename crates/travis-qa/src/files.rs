//! Plugin file inventory

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::QaError;

/// Paths never treated as plugin code
const EXCLUDED: &[&str] = &["**/tests/**", "**/Test/**", "**/vendor/**"];

/// Extensions of plugin code files
const CODE_EXTENSIONS: &[&str] = &["php", "js", "twig", "less"];

/// PHP files that render UI
const UI_PHP_FILES: &[&str] = &["Controller.php", "Menu.php"];

/// Files of a plugin, as `/`-separated paths relative to the plugin directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginFiles {
    /// `.php`, `.js`, `.twig` and `.less` outside tests and vendored code
    pub code: Vec<String>,

    /// Images under a `screenshots` directory
    pub screenshots: Vec<String>,
}

impl PluginFiles {
    pub fn scan(plugin_dir: &Path) -> Result<Self, QaError> {
        let excluded = exclusions()?;
        let mut files = Self::default();

        for entry in WalkDir::new(plugin_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| QaError::Walk(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(plugin_dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if is_screenshot(&relative) {
                files.screenshots.push(relative);
            } else if is_code_file(&relative) && !excluded.is_match(&relative) {
                files.code.push(relative);
            }
        }

        debug!(
            "{} code files, {} screenshots in {}",
            files.code.len(),
            files.screenshots.len(),
            plugin_dir.display()
        );
        Ok(files)
    }

    pub fn has_ui_files(&self) -> bool {
        self.code.iter().any(|f| is_ui_file(f))
    }

    pub fn has_non_ui_files(&self) -> bool {
        self.code.iter().any(|f| !is_ui_file(f))
    }

    /// Code files with the given extension (`php`, `js`, ...)
    pub fn with_extension<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = &'a String> {
        self.code.iter().filter(move |f| extension_of(f) == Some(extension))
    }
}

fn exclusions() -> Result<GlobSet, QaError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in EXCLUDED {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn is_code_file(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| CODE_EXTENSIONS.contains(&ext))
}

fn is_screenshot(path: &str) -> bool {
    path.split('/').rev().skip(1).any(|dir| dir == "screenshots")
        && matches!(extension_of(path), Some("png" | "jpeg"))
}

/// Templates, scripts, stylesheets and the PHP files that render pages.
/// Only top-level `Controller.php` and `Menu.php` count.
pub fn is_ui_file(path: &str) -> bool {
    matches!(extension_of(path), Some("js" | "twig" | "less")) || UI_PHP_FILES.contains(&path)
}
