//! Generator settings
//!
//! Settings are merged from three layers, last wins:
//! 1. Built-in defaults
//! 2. Repo config (`<repo>/.travis-yml.toml`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveSettings, GeneratorSettings,
    KNOWN_DISTRIBUTIONS, REPO_CONFIG_FILE,
};
pub use merge::{deep_merge, merge_layers};
