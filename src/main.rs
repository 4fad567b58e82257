//! travis-yml CLI
//!
//! Entry point for the `travis-yml` command-line tool.

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process;
use travis_qa::{PluginQa, QaOptions};
use travis_scripts::generator::{check_compatible, read_manifest, required_version};
use travis_scripts::{GenerateOptions, GenerationSummary, Generator, Target};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "travis-yml")]
#[command(about = "Generates and checks .travis.yml files", version)]
struct Cli {
    /// Log what is being detected and kept
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate (or regenerate) a .travis.yml file
    Generate(GenerateArgs),

    /// Run the plugin quality checks
    Qa {
        /// Plugin directory to check
        plugin_dir: PathBuf,

        /// Expected plugin name
        #[arg(long, env = "PLUGIN_NAME")]
        plugin_name: String,

        /// Repository slug, `owner/repo`
        #[arg(long, env = "TRAVIS_REPO_SLUG")]
        repo_slug: String,

        /// Repository description plugin.json must match
        #[arg(long)]
        expected_description: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the platform version a plugin should be tested against
    RequiredVersion {
        /// Plugin directory holding plugin.json
        plugin_dir: PathBuf,

        /// Highest allowed version instead of the lowest
        #[arg(long)]
        max: bool,

        /// Ignore constraints on versions newer than this one
        #[arg(long)]
        tested_version: Option<String>,
    },

    /// Fail if the plugin requires a newer platform than the tested one
    CheckCompatible {
        /// Plugin directory holding plugin.json
        plugin_dir: PathBuf,

        /// Platform version the plugin is tested against
        #[arg(long)]
        against: String,
    },
}

#[derive(Args)]
#[group(id = "target-kind", multiple = false)]
struct TargetArgs {
    /// Generate for the platform itself
    #[arg(long)]
    core: bool,

    /// Generate for the named plugin
    #[arg(long)]
    plugin: Option<String>,

    /// Generate for the tests-plugins repository at this path
    #[arg(long)]
    tests_plugins: Option<PathBuf>,
}

impl TargetArgs {
    fn target(self) -> Option<Target> {
        if self.core {
            Some(Target::Core)
        } else if let Some(name) = self.plugin {
            Some(Target::Plugin(name))
        } else {
            self.tests_plugins.map(Target::TestsPlugins)
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// PHP versions to test against (comma-separated, e.g. "7.0,5.6")
    #[arg(long, value_delimiter = ',')]
    php_versions: Option<Vec<String>>,

    /// Travis distribution
    #[arg(long)]
    distribution: Option<String>,

    /// Use the container infrastructure
    #[arg(long)]
    sudo_false: bool,

    /// Add PHP test jobs even if no PHP tests were found
    #[arg(long)]
    force_php_tests: bool,

    /// Add UI test jobs even if no UI tests were found
    #[arg(long)]
    force_ui_tests: bool,

    /// Extra env.global entry, e.g. `MY_VAR=1` or an encrypted `secure: ...` (repeatable)
    #[arg(long)]
    extra_global_env: Vec<String>,

    /// Latest stable release to test plugins against (default: from git tags)
    #[arg(long)]
    latest_stable: Option<String>,

    /// Checkout of the platform
    #[arg(long, env = "PIWIK_ROOT_DIR", default_value = ".")]
    platform_root: PathBuf,

    /// Repository the file belongs to (default: derived from the target)
    #[arg(long)]
    repo_root_dir: Option<PathBuf>,

    /// Write the file here instead
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Print a JSON summary
    #[arg(long)]
    json: bool,
}

impl GenerateArgs {
    /// Settings given on the command line, as a config layer
    fn overrides(&self) -> Option<Value> {
        let mut layer = Map::new();

        if let Some(versions) = &self.php_versions {
            layer.insert("php_versions".to_string(), Value::from(versions.clone()));
        }
        if let Some(distribution) = &self.distribution {
            layer.insert("distribution".to_string(), Value::from(distribution.clone()));
        }
        for (key, set) in [
            ("sudo_false", self.sudo_false),
            ("force_php_tests", self.force_php_tests),
            ("force_ui_tests", self.force_ui_tests),
        ] {
            if set {
                layer.insert(key.to_string(), Value::Bool(true));
            }
        }
        if !self.extra_global_env.is_empty() {
            layer.insert(
                "extra_global_env".to_string(),
                Value::from(self.extra_global_env.clone()),
            );
        }
        if let Some(version) = &self.latest_stable {
            layer.insert("latest_stable".to_string(), Value::from(version.clone()));
        }

        if layer.is_empty() {
            None
        } else {
            Some(Value::Object(layer))
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Qa {
            plugin_dir,
            plugin_name,
            repo_slug,
            expected_description,
            json,
        } => run_qa(
            QaOptions {
                plugin_dir,
                plugin_name,
                repo_slug,
                expected_description,
            },
            json,
        ),
        Commands::RequiredVersion {
            plugin_dir,
            max,
            tested_version,
        } => run_required_version(&plugin_dir, max, tested_version.as_deref()),
        Commands::CheckCompatible { plugin_dir, against } => {
            run_check_compatible(&plugin_dir, &against)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_generate(args: GenerateArgs) {
    let overrides = args.overrides();
    let json = args.json;
    let options = GenerateOptions {
        target: args.target.target(),
        platform_root: args.platform_root,
        repo_root_dir: args.repo_root_dir,
        dump: args.dump,
    };

    let generator = match Generator::new(options, overrides) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let generation = match generator.generate() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = generator.write(&generation) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let summary = GenerationSummary::from_generation(&generation);
    if json {
        match summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", summary.to_human());
    }
}

fn run_qa(options: QaOptions, json: bool) {
    let qa = match PluginQa::new(options) {
        Ok(qa) => qa,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let report = qa.run();
    if json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", report.to_human());
    }

    if !report.passed() {
        process::exit(1);
    }
}

fn run_required_version(plugin_dir: &Path, max: bool, tested_version: Option<&str>) {
    let manifest = match read_manifest(plugin_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!("{}", required_version(&manifest, tested_version, max));
}

fn run_check_compatible(plugin_dir: &Path, against: &str) {
    let manifest = match read_manifest(plugin_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut compatible = true;
    for result in check_compatible(&manifest, against) {
        if result.compatible {
            println!(
                "Required platform version '{}' is satisfied by the tested version {}",
                result.required, against
            );
        } else {
            compatible = false;
            eprintln!(
                "Required platform version '{}' is newer than the tested version {}",
                result.required, against
            );
            eprintln!(
                "Did the plugin require a version that does not exist yet? \
                 Make sure PIWIK_TEST_TARGET names the right version, branch or commit."
            );
        }
    }

    if !compatible {
        process::exit(1);
    }
}
