//! Effective generator settings with provenance
//!
//! Records which sources contributed to the merged settings, with a digest
//! of every file that was read.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Name of the optional per-repository settings file
pub const REPO_CONFIG_FILE: &str = ".travis-yml.toml";

/// Distributions the generated file may request
pub const KNOWN_DISTRIBUTIONS: &[&str] = &["trusty", "xenial", "bionic", "focal"];

/// Origin of a settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Repo,
    Cli,
}

/// A contributing settings source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Settings consumed by the generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// PHP versions to test against, e.g. `["7.2", "7.0"]`
    pub php_versions: Vec<String>,

    /// Travis distribution (`dist:`)
    pub distribution: String,

    /// Use the container infrastructure (`sudo: false`)
    pub sudo_false: bool,

    /// Add PHP test jobs even if no PHP tests were found
    pub force_php_tests: bool,

    /// Add UI test jobs even if no UI tests were found
    pub force_ui_tests: bool,

    /// Extra `env.global` entries such as `MY_VAR=1` or `secure: <encrypted>`
    #[serde(default)]
    pub extra_global_env: Vec<String>,

    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub apt_packages: Vec<String>,

    /// Latest stable platform release; looked up from git tags when unset
    #[serde(default)]
    pub latest_stable: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            php_versions: defaults.php_versions,
            distribution: defaults.distribution,
            sudo_false: defaults.sudo_false,
            force_php_tests: defaults.force_php_tests,
            force_ui_tests: defaults.force_ui_tests,
            extra_global_env: Vec::new(),
            services: defaults.services,
            apt_packages: defaults.apt_packages,
            latest_stable: None,
        }
    }
}

/// Merged settings plus the sources they came from
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub settings: GeneratorSettings,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Top-level keys set by the repo file or the CLI
    pub overridden: Vec<String>,
}

impl EffectiveSettings {
    /// Build settings from the built-in defaults, an optional repo file and
    /// CLI overrides. A repo file that does not exist is skipped.
    pub fn build(
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = repo_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Repo,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut overridden: Vec<String> = layers
            .iter()
            .skip(1)
            .filter_map(Value::as_object)
            .flat_map(|table| table.keys().cloned())
            .collect();
        overridden.sort();
        overridden.dedup();

        let merged = merge_layers(layers);
        let settings: GeneratorSettings = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(format!("Invalid settings: {}", e)))?;

        Self::validate(&settings)?;

        Ok(Self {
            settings,
            sources,
            overridden,
        })
    }

    /// True if `key` was set above the built-in defaults
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overridden.iter().any(|k| k == key)
    }

    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let table: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(table), digest))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::Array(items.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    fn validate(settings: &GeneratorSettings) -> Result<(), ConfigError> {
        if settings.php_versions.is_empty() {
            return Err(ConfigError::ValidationError(
                "php_versions must list at least one version".to_string(),
            ));
        }

        if settings.php_versions.iter().any(|v| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "php_versions must not contain empty entries".to_string(),
            ));
        }

        if !KNOWN_DISTRIBUTIONS.contains(&settings.distribution.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "distribution must be one of {}, got '{}'",
                KNOWN_DISTRIBUTIONS.join(", "),
                settings.distribution
            )));
        }

        Ok(())
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let effective = EffectiveSettings::build(None, None).unwrap();

        assert_eq!(effective.settings, GeneratorSettings::default());
        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_cli_override() {
        let cli = serde_json::json!({"php_versions": ["7.0", "5.6.4"], "sudo_false": true});
        let effective = EffectiveSettings::build(None, Some(cli)).unwrap();

        assert_eq!(effective.settings.php_versions, vec!["7.0", "5.6.4"]);
        assert!(effective.settings.sudo_false);
        assert_eq!(effective.settings.distribution, "trusty");
    }

    #[test]
    fn test_repo_file_layer() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "distribution = \"xenial\"").unwrap();
        writeln!(temp, "extra_global_env = [\"MY_VAR=1\"]").unwrap();

        let effective = EffectiveSettings::build(Some(temp.path()), None).unwrap();

        assert_eq!(effective.settings.distribution, "xenial");
        assert_eq!(effective.settings.extra_global_env, vec!["MY_VAR=1"]);
        assert_eq!(effective.sources[1].origin, ConfigOrigin::Repo);
        assert_eq!(effective.sources[1].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_cli_beats_repo_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "distribution = \"xenial\"").unwrap();

        let cli = serde_json::json!({"distribution": "bionic"});
        let effective = EffectiveSettings::build(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(effective.settings.distribution, "bionic");
        assert_eq!(effective.sources.len(), 3);
    }

    #[test]
    fn test_overridden_keys() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "distribution = \"xenial\"").unwrap();

        let cli = serde_json::json!({"php_versions": ["7.0"], "distribution": "bionic"});
        let effective = EffectiveSettings::build(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(effective.overridden, vec!["distribution", "php_versions"]);
        assert!(effective.is_overridden("php_versions"));
        assert!(!effective.is_overridden("sudo_false"));

        let defaults = EffectiveSettings::build(None, None).unwrap();
        assert!(defaults.overridden.is_empty());
    }

    #[test]
    fn test_missing_repo_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPO_CONFIG_FILE);

        let effective = EffectiveSettings::build(Some(&path), None).unwrap();
        assert_eq!(effective.sources.len(), 1);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "php_version = [\"7.0\"]").unwrap();

        let err = EffectiveSettings::build(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "distribution = ").unwrap();

        let err = EffectiveSettings::build(Some(temp.path()), None).unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_validation_empty_php_versions() {
        let cli = serde_json::json!({"php_versions": []});
        let err = EffectiveSettings::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("php_versions"));
    }

    #[test]
    fn test_validation_distribution() {
        let cli = serde_json::json!({"distribution": "precise"});
        let err = EffectiveSettings::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("distribution"));
    }
}
