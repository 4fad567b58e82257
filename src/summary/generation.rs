//! Generation summary (`travis-yml generate --json`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigSource;
use crate::generator::{Generation, Target};

/// Schema version of the generation summary
pub const GENERATION_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier of the generation summary
pub const GENERATION_SUMMARY_SCHEMA_ID: &str = "travis-yml/generation_summary@1";

/// What a generation run did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub schema_version: u32,

    pub schema_id: String,

    pub created_at: DateTime<Utc>,

    /// `core`, `plugin` or `tests-plugins`
    pub mode: String,

    /// Plugin name for plugin runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// Path the file was written to
    pub output_path: String,

    /// SHA-256 of the file that was merged with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_digest: Option<String>,

    /// Sections kept from the existing file
    pub preserved_sections: Vec<String>,

    /// Unknown sections copied through
    pub passthrough_sections: Vec<String>,

    /// Extension fragments spliced in
    pub fragments: Vec<String>,

    pub config_sources: Vec<ConfigSource>,
}

impl GenerationSummary {
    pub fn from_generation(generation: &Generation) -> Self {
        let plugin = match &generation.target {
            Target::Plugin(name) => Some(name.clone()),
            _ => None,
        };

        Self {
            schema_version: GENERATION_SUMMARY_SCHEMA_VERSION,
            schema_id: GENERATION_SUMMARY_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            mode: generation.target.mode().to_string(),
            plugin,
            output_path: generation.write_path.display().to_string(),
            existing_digest: generation.existing_digest.clone(),
            preserved_sections: generation.rendered.preserved.clone(),
            passthrough_sections: generation.rendered.passthrough.clone(),
            fragments: generation.fragments.clone(),
            config_sources: generation.sources.clone(),
        }
    }

    /// One line per fact, for the terminal
    pub fn to_human(&self) -> String {
        let mut lines = vec![format!("Generated .travis.yml file at '{}'", self.output_path)];
        if self.existing_digest.is_none() {
            lines.push("  no existing file, all sections generated".to_string());
        }
        if !self.preserved_sections.is_empty() {
            lines.push(format!("  kept: {}", self.preserved_sections.join(", ")));
        }
        if !self.passthrough_sections.is_empty() {
            lines.push(format!("  passed through: {}", self.passthrough_sections.join(", ")));
        }
        if !self.fragments.is_empty() {
            lines.push(format!("  fragments: {}", self.fragments.join(", ")));
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
