//! Immutable view model and the section bodies computed from it

use crate::view::{
    fragment_lines, Block, FragmentLookup, GeneratedValues, APT_PACKAGES_PARTIAL,
    APT_SOURCES_PARTIAL, ENV_SECTION, MATRIX_SECTION,
};

use super::Target;

/// Location of the travis helper scripts inside the platform checkout
const SCRIPTS_DIR: &str = "$PIWIK_ROOT_DIR/tests/travis";

/// A test job of the build matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestJob {
    /// Suite name, e.g. `PluginTests` or `UITests`
    pub suite: String,
    /// Extra environment, e.g. `MYSQL_ADAPTER=PDO_MYSQL`
    pub vars: String,
}

impl TestJob {
    pub fn new(suite: impl Into<String>, vars: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            vars: vars.into(),
        }
    }

    /// The `env.matrix` entry for this job
    pub fn env_line(&self) -> String {
        if self.vars.is_empty() {
            format!("TEST_SUITE={}", self.suite)
        } else {
            format!("TEST_SUITE={} {}", self.suite, self.vars)
        }
    }
}

/// A `matrix.exclude` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedJob {
    /// Written as a comment above the entry
    pub description: Option<String>,
    pub php: String,
    pub env: String,
}

/// Everything the sections are computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub target: Target,
    pub php_versions: Vec<String>,
    pub latest_stable: String,
    pub tests_to_run: Vec<TestJob>,
    pub tests_to_exclude: Vec<ExcludedJob>,
    /// Command that regenerates the file on travis
    pub console_command: String,
    pub travis_sh_location: String,
    pub travis_sh_cwd: String,
    pub distribution: String,
    pub sudo_false: bool,
    pub services: Vec<String>,
    pub apt_packages: Vec<String>,
    pub extra_global_env: Vec<String>,
}

impl ViewModel {
    /// Compute every generator-owned section plus the env/matrix defaults
    pub fn generated_values<F>(&self, partials: &F) -> GeneratedValues
    where
        F: FragmentLookup + ?Sized,
    {
        GeneratedValues::new()
            .with("language", Block::scalar("php"))
            .with("php", Block::list(&self.php_versions))
            .with("group", Block::scalar("stable"))
            .with("services", Block::list(&self.services))
            .with("addons", self.addons(partials))
            .with(ENV_SECTION, self.env())
            .with(MATRIX_SECTION, self.matrix())
            .with("dist", Block::scalar(&self.distribution))
            .with("sudo", Block::scalar(if self.sudo_false { "false" } else { "required" }))
            .with("script", Block::scalar(&self.travis_sh_location))
            .with("before_install", self.before_install())
            .with("install", self.install())
            .with("before_script", self.before_script())
            .with("after_script", self.after_script())
            .with("after_success", self.after_success())
    }

    fn root_dir(&self) -> &'static str {
        match self.target {
            Target::Core => "$TRAVIS_BUILD_DIR",
            Target::Plugin(_) | Target::TestsPlugins(_) => "$TRAVIS_BUILD_DIR/piwik",
        }
    }

    fn addons<F>(&self, partials: &F) -> Block
    where
        F: FragmentLookup + ?Sized,
    {
        let sources = partials
            .partial(APT_SOURCES_PARTIAL)
            .map(fragment_lines)
            .unwrap_or_default();
        let mut packages: Vec<String> = self.apt_packages.iter().map(|p| format!("- {}", p)).collect();
        packages.extend(
            partials
                .partial(APT_PACKAGES_PARTIAL)
                .map(fragment_lines)
                .unwrap_or_default(),
        );

        let mut lines = vec!["apt:".to_string()];
        if !sources.is_empty() {
            lines.push("  sources:".to_string());
            lines.extend(sources.into_iter().map(|l| format!("    {}", l)));
        }
        lines.push("  packages:".to_string());
        lines.extend(packages.into_iter().map(|l| format!("    {}", l)));
        Block::Lines(lines)
    }

    fn env(&self) -> Block {
        let mut global = Vec::new();
        if let Target::Plugin(name) = &self.target {
            global.push(format!("PLUGIN_NAME={}", name));
        }
        global.push(format!("PIWIK_ROOT_DIR={}", self.root_dir()));
        if let Target::Plugin(_) = self.target {
            global.push("PIWIK_TEST_TARGET=maximum_supported_piwik".to_string());
            global.push(format!("PIWIK_LATEST_STABLE_TEST_TARGET={}", self.latest_stable));
        }
        global.extend(self.extra_global_env.iter().cloned());

        let mut lines = vec!["global:".to_string()];
        lines.extend(global.iter().map(|v| format!("  - {}", v)));
        lines.push("matrix:".to_string());
        lines.extend(self.tests_to_run.iter().map(|job| format!("  - {}", job.env_line())));
        Block::Lines(lines)
    }

    fn matrix(&self) -> Block {
        let mut lines = vec!["fast_finish: true".to_string()];
        if !self.tests_to_exclude.is_empty() {
            lines.push("exclude:".to_string());
            for job in &self.tests_to_exclude {
                if let Some(description) = &job.description {
                    lines.push(format!("  # {}", description));
                }
                lines.push(format!("  - php: {}", job.php));
                lines.push(format!("    env: {}", job.env));
            }
        }
        Block::Lines(lines)
    }

    fn before_install(&self) -> Block {
        let mut steps = Vec::new();
        match self.target {
            Target::Core => {
                steps.push("git submodule update --init -q tests/travis".to_string());
            }
            Target::Plugin(_) | Target::TestsPlugins(_) => {
                steps.push(
                    "git clone -q --depth=1 https://github.com/matomo-org/matomo.git \"$PIWIK_ROOT_DIR\""
                        .to_string(),
                );
                steps.push(
                    "(cd \"$PIWIK_ROOT_DIR\" && git submodule update --init -q tests/travis)"
                        .to_string(),
                );
            }
        }
        steps.push("phpenv config-rm xdebug.ini || true".to_string());
        Block::list(steps)
    }

    fn install(&self) -> Block {
        let mut steps = vec![format!(
            "export GENERATE_TRAVIS_YML_COMMAND=\"{}\"",
            self.console_command
        )];
        match self.target {
            Target::Plugin(_) => {
                steps.push(format!("{}/checkout_test_against_branch.sh", SCRIPTS_DIR));
                steps.push(format!("{}/install_plugin.sh", SCRIPTS_DIR));
            }
            Target::TestsPlugins(_) => {
                steps.push(format!("{}/checkout_test_against_branch.sh", SCRIPTS_DIR));
            }
            Target::Core => {}
        }
        steps.push(format!("{}/check_travis_yml_up_to_date.sh", SCRIPTS_DIR));
        Block::list(steps)
    }

    fn before_script(&self) -> Block {
        Block::list([
            format!("{}/before_script.sh", SCRIPTS_DIR),
            format!("cd {}", self.travis_sh_cwd),
        ])
    }

    fn after_script(&self) -> Block {
        Block::list([
            "cat $PIWIK_ROOT_DIR/tmp/php-fpm.log || true".to_string(),
            format!("{}/upload_artifacts.sh", SCRIPTS_DIR),
        ])
    }

    fn after_success(&self) -> Block {
        Block::list([
            "cd $PIWIK_ROOT_DIR".to_string(),
            format!("{}/autoupdate_travis_yml.sh", SCRIPTS_DIR),
        ])
    }
}
