//! .travis.yml generation
//!
//! Works out the section values for a target (the platform itself, a plugin
//! or the tests-plugins repository), merges them with the existing file and
//! writes the result.

mod command;
mod model;
mod plugin;
mod requirements;
mod versions;

pub use command::{addslashes, self_referential_command, GENERATE_COMMAND, OMITTED_SETTINGS};
pub use model::{ExcludedJob, TestJob, ViewModel};
pub use plugin::{plugin_minimum_php_version, PluginTestSuites, TEST_DIRS};
pub use requirements::{
    check_compatible, maximum_required, minimum_required, read_manifest, required_version,
    required_versions, Compatibility, RequiredVersion, RequirementError, FALLBACK_VERSION,
};
pub use versions::{
    compare_versions, latest_release_tag, latest_stable_from_git, minimum_version,
    version_known_on_travis, KNOWN_PATCH_VERSIONS,
};

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{ConfigError, ConfigSource, EffectiveSettings, REPO_CONFIG_FILE};
use crate::document::{self, Document, DocumentError};
use crate::view::{self, FragmentLookup, Fragments, GeneratedValues, Rendered, ENV_SECTION};

/// Name of the generated file
pub const TRAVIS_YML: &str = ".travis.yml";

/// Used when no release tag can be found
pub const FALLBACK_LATEST_STABLE: &str = "master";

/// Suites run for the platform itself
pub const CORE_TEST_SUITES: &[&str] = &[
    "UnitTests",
    "SystemTestsCore",
    "IntegrationTestsCore",
    "SystemTestsPlugins",
    "IntegrationTestsPlugins",
    "UITests",
    "JavascriptTests",
];

/// Suites that only need to run once, on the highest PHP version
const SINGLE_PHP_SUITES: &[&str] = &["UITests", "JavascriptTests"];

const MYSQL_ADAPTER: &str = "MYSQL_ADAPTER=PDO_MYSQL";
const AGAINST_TEST_TARGET: &str = "TEST_AGAINST_PIWIK_BRANCH=$PIWIK_TEST_TARGET";
const AGAINST_MINIMUM_REQUIRED: &str = "TEST_AGAINST_CORE=minimum_required_piwik";

/// What the file is generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The platform repository
    Core,
    /// A plugin, by name
    Plugin(String),
    /// The tests-plugins repository at the given path
    TestsPlugins(PathBuf),
}

impl Target {
    pub fn mode(&self) -> &'static str {
        match self {
            Target::Core => "core",
            Target::Plugin(_) => "plugin",
            Target::TestsPlugins(_) => "tests-plugins",
        }
    }
}

/// Options that locate the input and output files
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub target: Option<Target>,

    /// Checkout of the platform; plugins live in `<platform_root>/plugins`
    pub platform_root: PathBuf,

    /// Overrides the repository the file belongs to
    pub repo_root_dir: Option<PathBuf>,

    /// Write here instead of `<repo>/.travis.yml`
    pub dump: Option<PathBuf>,
}

/// Generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("Cannot write to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result of a generation run, before it is written
#[derive(Debug, Clone)]
pub struct Generation {
    pub target: Target,

    /// `<repo>/.travis.yml`, where the existing file was read from
    pub output_path: PathBuf,

    /// Where the contents will be written (differs with `--dump`)
    pub write_path: PathBuf,

    /// SHA-256 of the existing file, if there was one
    pub existing_digest: Option<String>,

    pub rendered: Rendered,

    /// Fragment files that were found
    pub fragments: Vec<String>,

    pub sources: Vec<ConfigSource>,
}

/// Generator for one target
#[derive(Debug)]
pub struct Generator {
    target: Target,
    options: GenerateOptions,
    settings: EffectiveSettings,
    cli_overrides: Option<Value>,
}

impl Generator {
    /// Resolve the target and load the layered settings. `cli_overrides`
    /// holds the settings given on the command line.
    pub fn new(options: GenerateOptions, cli_overrides: Option<Value>) -> Result<Self, GenerateError> {
        let target = options.target.clone().ok_or_else(|| {
            GenerateError::MissingInput(
                "one of --core, --plugin or --tests-plugins is required".to_string(),
            )
        })?;

        let repo_root = Self::resolve_repo_root(&target, &options);
        let settings =
            EffectiveSettings::build(Some(&repo_root.join(REPO_CONFIG_FILE)), cli_overrides.clone())?;

        Ok(Self {
            target,
            options,
            settings,
            cli_overrides,
        })
    }

    fn resolve_repo_root(target: &Target, options: &GenerateOptions) -> PathBuf {
        if let Some(dir) = &options.repo_root_dir {
            return dir.clone();
        }
        match target {
            Target::Core => options.platform_root.clone(),
            Target::Plugin(name) => options.platform_root.join("plugins").join(name),
            Target::TestsPlugins(path) => path.clone(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// Repository the generated file belongs to
    pub fn repo_root(&self) -> PathBuf {
        Self::resolve_repo_root(&self.target, &self.options)
    }

    /// `<repo>/.travis.yml`; `--dump` has no effect on this path
    pub fn output_path(&self) -> PathBuf {
        self.repo_root().join(TRAVIS_YML)
    }

    /// Directory holding the extension fragments, if the target has one
    pub fn fragments_dir(&self) -> Option<PathBuf> {
        match self.target {
            Target::Core => None,
            Target::Plugin(_) => Some(self.repo_root().join("tests").join("travis")),
            Target::TestsPlugins(_) => Some(self.repo_root().join("travis")),
        }
    }

    /// Generate the new contents without writing them
    pub fn generate(&self) -> Result<Generation, GenerateError> {
        let output_path = self.output_path();
        let existing = read_existing(&output_path)?;
        let fragments = self.load_fragments();

        let values = self.generated_values(&fragments);
        let rendered = view::render(&values, &existing, &fragments);

        if rendered.preserved.iter().any(|s| s == ENV_SECTION)
            && !self.settings.settings.extra_global_env.is_empty()
        {
            info!("Existing .yml file found, ignoring global variables specified on command line.");
        }
        for name in &rendered.preserved {
            info!("Keeping existing '{}' section.", name);
        }
        for name in &rendered.passthrough {
            info!("Keeping unknown section '{}'.", name);
        }

        Ok(Generation {
            target: self.target.clone(),
            write_path: self.options.dump.clone().unwrap_or_else(|| output_path.clone()),
            output_path,
            existing_digest: existing.digest().map(str::to_string),
            rendered,
            fragments: fragments.names(),
            sources: self.settings.sources.clone(),
        })
    }

    /// Write the generated contents, returning the path written to
    pub fn write(&self, generation: &Generation) -> Result<PathBuf, GenerateError> {
        let path = &generation.write_path;
        fs::write(path, &generation.rendered.text).map_err(|source| GenerateError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path.clone())
    }

    /// Values of every generated section for this target
    pub fn generated_values<F>(&self, fragments: &F) -> GeneratedValues
    where
        F: FragmentLookup + ?Sized,
    {
        self.view_model().generated_values(fragments)
    }

    /// Collect everything the sections are computed from
    pub fn view_model(&self) -> ViewModel {
        let settings = &self.settings.settings;
        let (php_versions, minimum_php) = self.php_versions();
        info!("Using minimum PHP version: {}", minimum_php);

        let (tests_to_run, tests_to_exclude) = match &self.target {
            Target::Core => core_jobs(&minimum_php),
            Target::Plugin(_) => plugin_jobs(&self.plugin_test_suites(), &minimum_php),
            Target::TestsPlugins(_) => (vec![TestJob::new("PluginTests", MYSQL_ADAPTER)], Vec::new()),
        };

        let (travis_sh_location, travis_sh_cwd) = match self.target {
            Target::TestsPlugins(_) => ("./travis.sh", "$TRAVIS_BUILD_DIR"),
            _ => ("$PIWIK_ROOT_DIR/tests/travis/travis.sh", "tests/PHPUnit"),
        };

        let command = self_referential_command(&self.target, self.cli_overrides.as_ref());

        ViewModel {
            target: self.target.clone(),
            php_versions,
            latest_stable: self.latest_stable(),
            tests_to_run,
            tests_to_exclude,
            console_command: addslashes(&command),
            travis_sh_location: travis_sh_location.to_string(),
            travis_sh_cwd: travis_sh_cwd.to_string(),
            distribution: settings.distribution.clone(),
            sudo_false: settings.sudo_false,
            services: settings.services.clone(),
            apt_packages: settings.apt_packages.clone(),
            extra_global_env: settings.extra_global_env.clone(),
        }
    }

    /// PHP versions to write and the minimum among them.
    ///
    /// A plugin's `plugin.json` requirement replaces the lowest configured
    /// version unless the versions were set explicitly.
    fn php_versions(&self) -> (Vec<String>, String) {
        let mut versions = self.settings.settings.php_versions.clone();
        let mut minimum = minimum_version(&versions).cloned().unwrap_or_default();

        if let Target::Plugin(_) = self.target {
            if !self.settings.is_overridden("php_versions") {
                if let Some(required) = plugin_minimum_php_version(&self.repo_root()) {
                    let lowest = versions
                        .iter()
                        .enumerate()
                        .min_by(|(_, a), (_, b)| compare_versions(a, b))
                        .map(|(i, _)| i);
                    if let Some(i) = lowest {
                        versions[i] = required.clone();
                    }
                    minimum = required;
                }
            }
        }

        let versions = versions.iter().map(|v| version_known_on_travis(v)).collect();
        (versions, version_known_on_travis(&minimum))
    }

    fn plugin_test_suites(&self) -> PluginTestSuites {
        let settings = &self.settings.settings;
        let mut suites = PluginTestSuites::detect(&self.repo_root());
        suites.php |= settings.force_php_tests;
        suites.ui |= settings.force_ui_tests;

        if suites.is_empty() {
            info!("No tests found for this plugin, generating PluginTests jobs.");
            suites.php = true;
        }
        suites
    }

    fn latest_stable(&self) -> String {
        if let Some(version) = &self.settings.settings.latest_stable {
            return version.clone();
        }
        if !matches!(self.target, Target::Plugin(_)) {
            return FALLBACK_LATEST_STABLE.to_string();
        }

        match latest_stable_from_git(&self.options.platform_root) {
            Some(version) => {
                info!("Testing against latest known stable {}.", version);
                version
            }
            None => {
                info!(
                    "No release tag found, testing against {}.",
                    FALLBACK_LATEST_STABLE
                );
                FALLBACK_LATEST_STABLE.to_string()
            }
        }
    }

    fn load_fragments(&self) -> Fragments {
        let Some(dir) = self.fragments_dir() else {
            return Fragments::new();
        };

        match Fragments::load(&dir) {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!("Cannot read fragments in {}: {}", dir.display(), e);
                Fragments::new()
            }
        }
    }
}

/// Existing document at `path`, empty if there is none yet
fn read_existing(path: &Path) -> Result<Document, GenerateError> {
    if path.exists() {
        info!("Found existing YAML file at {}.", path.display());
    } else {
        info!(
            "Could not find existing YAML file at {}, generating a new one.",
            path.display()
        );
    }

    document::read(path).map_err(|source| GenerateError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn core_jobs(minimum_php: &str) -> (Vec<TestJob>, Vec<ExcludedJob>) {
    let run: Vec<TestJob> = CORE_TEST_SUITES
        .iter()
        .map(|suite| TestJob::new(*suite, MYSQL_ADAPTER))
        .collect();

    let exclude = run
        .iter()
        .filter(|job| SINGLE_PHP_SUITES.contains(&job.suite.as_str()))
        .map(|job| ExcludedJob {
            description: Some(format!("execute {} only w/ the highest PHP version", job.suite)),
            php: minimum_php.to_string(),
            env: job.env_line(),
        })
        .collect();

    (run, exclude)
}

fn plugin_jobs(suites: &PluginTestSuites, minimum_php: &str) -> (Vec<TestJob>, Vec<ExcludedJob>) {
    let mut run = Vec::new();
    let mut exclude = Vec::new();
    let against_target = format!("{} {}", MYSQL_ADAPTER, AGAINST_TEST_TARGET);
    let against_minimum = format!("{} {}", MYSQL_ADAPTER, AGAINST_MINIMUM_REQUIRED);

    let excluded = |description: &str, job: &TestJob| ExcludedJob {
        description: Some(format!("execute {} only w/ PHP {}", description, minimum_php)),
        php: minimum_php.to_string(),
        env: job.env_line(),
    };

    if suites.php {
        let latest = TestJob::new("PluginTests", &against_target);
        let minimum = TestJob::new("PluginTests", &against_minimum);
        exclude.push(excluded("latest stable tests", &minimum));
        run.push(latest);
        run.push(minimum);
    }

    if suites.ui {
        let ui = TestJob::new("UITests", &against_target);
        exclude.push(excluded("UI tests", &ui));
        run.push(ui);
    }

    if suites.javascript {
        let latest = TestJob::new("JavascriptTests", &against_target);
        let minimum = TestJob::new("JavascriptTests", &against_minimum);
        exclude.push(excluded("JS tests", &latest));
        exclude.push(excluded("JS tests", &minimum));
        run.push(latest);
        run.push(minimum);
    }

    (run, exclude)
}
