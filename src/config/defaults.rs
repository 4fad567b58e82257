//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAXIMUM_PHP_VERSION: &str = "5.6";
pub const DEFAULT_MINIMUM_PHP_VERSION: &str = "5.5";

/// Built-in default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// PHP versions to test against (default: 5.6, 5.5)
    pub php_versions: Vec<String>,

    /// Travis distribution (default: "trusty")
    pub distribution: String,

    /// Use the container infrastructure, `sudo: false` (default: false)
    pub sudo_false: bool,

    /// Always add PHP test jobs for plugins (default: false)
    pub force_php_tests: bool,

    /// Always add UI test jobs for plugins (default: false)
    pub force_ui_tests: bool,

    /// Services started for every job
    pub services: Vec<String>,

    /// Apt packages installed for every job
    pub apt_packages: Vec<String>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            php_versions: vec![
                DEFAULT_MAXIMUM_PHP_VERSION.to_string(),
                DEFAULT_MINIMUM_PHP_VERSION.to_string(),
            ],
            distribution: "trusty".to_string(),
            sudo_false: false,
            force_php_tests: false,
            force_ui_tests: false,
            services: vec!["mysql".to_string(), "redis-server".to_string()],
            apt_packages: vec![
                "ttf-mscorefonts-installer".to_string(),
                "imagemagick".to_string(),
            ],
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "php_versions": self.php_versions,
            "distribution": self.distribution,
            "sudo_false": self.sudo_false,
            "force_php_tests": self.force_php_tests,
            "force_ui_tests": self.force_ui_tests,
            "extra_global_env": [],
            "services": self.services,
            "apt_packages": self.apt_packages,
        })
    }
}
