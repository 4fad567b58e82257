//! Individual quality checks

use regex_lite::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::policy::{field_matches, Publisher};
use crate::report::Finding;
use crate::PluginQa;

type Check = fn(&PluginQa) -> Finding;

/// Every check, in the order they run
pub const CHECKS: &[(&str, Check)] = &[
    ("php-tests", php_tests),
    ("ui-tests", ui_tests),
    ("screenshots", screenshots),
    ("description", description),
    ("plugin-name", plugin_name),
    ("composer-version", composer_version),
    ("open-source-fields", open_source_fields),
    ("closed-source-fields", closed_source_fields),
    ("php-headers", php_headers),
    ("js-headers", js_headers),
];

/// First of `tests/` and `Test/` that exists
fn tests_dir(plugin_dir: &Path) -> Option<PathBuf> {
    ["tests", "Test"]
        .iter()
        .map(|d| plugin_dir.join(d))
        .find(|d| d.is_dir())
}

/// Files directly inside `dir` whose name ends with `suffix`
fn count_files(dir: &Path, suffix: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!("No directory {}", dir.display());
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .count()
}

fn php_tests(qa: &PluginQa) -> Finding {
    const CHECK: &str = "php-tests";
    if !qa.files().has_non_ui_files() {
        return Finding::skip(CHECK, "plugin has no non-UI code files");
    }
    let Some(dir) = tests_dir(&qa.options().plugin_dir) else {
        return Finding::fail(CHECK, "Plugin has no tests.");
    };

    let missing: Vec<&str> = ["Integration", "System"]
        .into_iter()
        .filter(|kind| count_files(&dir.join(kind), "Test.php") == 0)
        .collect();
    if missing.is_empty() {
        Finding::pass(CHECK, "Integration and System tests found")
    } else {
        Finding::fail(CHECK, format!("Plugin has 0 {} tests.", missing.join(" and ")))
    }
}

fn ui_tests(qa: &PluginQa) -> Finding {
    const CHECK: &str = "ui-tests";
    if !qa.files().has_ui_files() {
        return Finding::skip(CHECK, "plugin has no UI files");
    }
    let Some(dir) = tests_dir(&qa.options().plugin_dir) else {
        return Finding::fail(CHECK, "Plugin has no tests.");
    };

    match count_files(&dir.join("UI"), "_spec.js") {
        0 => Finding::fail(CHECK, "Plugin has 0 UI tests."),
        n => Finding::pass(CHECK, format!("{} UI test file(s)", n)),
    }
}

fn screenshots(qa: &PluginQa) -> Finding {
    const CHECK: &str = "screenshots";
    if !qa.files().has_ui_files() {
        return Finding::skip(CHECK, "plugin has no UI files");
    }
    match qa.files().screenshots.len() {
        0 => Finding::fail(CHECK, "Plugin has UI files but no screenshots."),
        n => Finding::pass(CHECK, format!("{} screenshot(s)", n)),
    }
}

fn description(qa: &PluginQa) -> Finding {
    const CHECK: &str = "description";
    let Some(text) = qa.manifest().get("description").and_then(Value::as_str) else {
        return Finding::fail(CHECK, "plugin.json has no description");
    };
    if text.contains("TODO") {
        return Finding::fail(CHECK, "plugin.json description contains TODO");
    }

    match &qa.options().expected_description {
        Some(expected) if expected.is_empty() => {
            Finding::fail(CHECK, "repository description is empty")
        }
        Some(expected) if expected != text => Finding::fail(
            CHECK,
            "Plugin description in plugin.json does not match the repository description.",
        ),
        Some(_) => Finding::pass(CHECK, "description matches the repository description"),
        None => Finding::pass(CHECK, "description present"),
    }
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^namespace\s+Piwik\\Plugins\\([^;\s\\]+)").expect("valid namespace pattern")
    })
}

fn plugin_name(qa: &PluginQa) -> Finding {
    const CHECK: &str = "plugin-name";
    let expected = &qa.options().plugin_name;
    let Some(name) = qa.manifest().get("name").and_then(Value::as_str) else {
        return Finding::fail(CHECK, "plugin.json has no name");
    };
    if name != expected {
        return Finding::fail(
            CHECK,
            format!(
                "Plugin name '{}' in plugin.json does not match plugin name '{}'.",
                name, expected
            ),
        );
    }

    let mismatched: Vec<&str> = qa
        .files()
        .with_extension("php")
        .filter(|file| {
            let Ok(contents) = fs::read_to_string(qa.options().plugin_dir.join(file)) else {
                return false;
            };
            namespace_pattern()
                .captures(&contents)
                .and_then(|c| c.get(1))
                .is_some_and(|m| m.as_str() != name)
        })
        .map(String::as_str)
        .collect();

    if mismatched.is_empty() {
        Finding::pass(CHECK, "plugin name and namespaces match")
    } else {
        Finding::fail(
            CHECK,
            format!(
                "Plugin name in namespace does not match plugin.json in: {}",
                mismatched.join(", ")
            ),
        )
    }
}

fn composer_version(qa: &PluginQa) -> Finding {
    const CHECK: &str = "composer-version";
    let Some(version) = qa.manifest().get("version") else {
        return Finding::fail(CHECK, "plugin.json has no version");
    };

    let path = qa.options().plugin_dir.join("composer.json");
    let Ok(contents) = fs::read_to_string(&path) else {
        return Finding::skip(CHECK, "no composer.json");
    };
    let composer: Value = match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) if !map.is_empty() => Value::Object(map),
        _ => return Finding::fail(CHECK, "composer.json file is either empty or invalid JSON"),
    };

    match composer.get("version") {
        None => Finding::fail(CHECK, "composer.json has no version"),
        Some(composer_version) if composer_version == version => {
            Finding::pass(CHECK, "versions match")
        }
        Some(_) => Finding::fail(
            CHECK,
            "Version in plugin.json does not match version in composer.json.",
        ),
    }
}

fn required_fields(qa: &PluginQa, check: &str, publisher: Publisher) -> Finding {
    if qa.publisher() != publisher {
        return Finding::skip(check, "does not apply to this repository owner");
    }

    let wrong: Vec<&str> = publisher
        .required_fields(&qa.options().plugin_name)
        .into_iter()
        .filter(|(field, expected)| {
            !qa.manifest()
                .get(*field)
                .is_some_and(|actual| field_matches(actual, expected))
        })
        .map(|(field, _)| field)
        .collect();

    if wrong.is_empty() {
        Finding::pass(check, "required plugin.json fields present")
    } else {
        Finding::fail(check, format!("plugin.json has wrong or missing: {}", wrong.join(", ")))
    }
}

fn open_source_fields(qa: &PluginQa) -> Finding {
    required_fields(qa, "open-source-fields", Publisher::OpenSource)
}

fn closed_source_fields(qa: &PluginQa) -> Finding {
    required_fields(qa, "closed-source-fields", Publisher::ClosedSource)
}

fn headers(qa: &PluginQa, check: &str, extension: &str, prefix: &str) -> Finding {
    let header = format!("{}{}", prefix, qa.publisher().header());
    let mut checked = 0;
    let missing: Vec<&str> = qa
        .files()
        .with_extension(extension)
        .inspect(|_| checked += 1)
        .filter(|file| {
            fs::read_to_string(qa.options().plugin_dir.join(file))
                .map(|contents| !contents.starts_with(&header))
                .unwrap_or(true)
        })
        .map(String::as_str)
        .collect();

    if checked == 0 {
        Finding::skip(check, format!("no .{} files", extension))
    } else if missing.is_empty() {
        Finding::pass(check, format!("{} file(s) have the expected header", checked))
    } else {
        Finding::fail(check, format!("missing header in: {}", missing.join(", ")))
    }
}

fn php_headers(qa: &PluginQa) -> Finding {
    headers(qa, "php-headers", "php", "<?php\n")
}

fn js_headers(qa: &PluginQa) -> Finding {
    headers(qa, "js-headers", "js", "")
}
