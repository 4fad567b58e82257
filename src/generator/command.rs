//! Command line that regenerates the file on travis

use serde_json::Value;

use super::Target;

/// Binary and subcommand that regenerate the file
pub const GENERATE_COMMAND: &str = "travis-yml generate";

/// Settings never repeated in the embedded command. Their values are
/// encrypted secrets that already live in the preserved `env` section.
pub const OMITTED_SETTINGS: &[&str] = &["extra_global_env"];

/// Escape `\`, `'`, `"` and NUL with a backslash
pub fn addslashes(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn push_option(command: &mut String, flag: &str, value: &str) {
    command.push_str(&format!(" --{}=\"{}\"", flag, addslashes(value)));
}

/// The command to embed in the generated file.
///
/// Carries the target and every CLI override except the omitted ones, and
/// always ends with `--verbose`. Local-only options (`--dump`,
/// `--repo-root-dir`, `--platform-root`) are never part of `cli_overrides`.
pub fn self_referential_command(target: &Target, cli_overrides: Option<&Value>) -> String {
    let mut command = GENERATE_COMMAND.to_string();

    match target {
        Target::Core => command.push_str(" --core"),
        Target::Plugin(name) => push_option(&mut command, "plugin", name),
        // on travis the tests repository is checked out next to the platform
        Target::TestsPlugins(_) => push_option(&mut command, "tests-plugins", ".."),
    }

    if let Some(Value::Object(overrides)) = cli_overrides {
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();

        for key in keys {
            let value = &overrides[key.as_str()];
            if OMITTED_SETTINGS.contains(&key.as_str()) {
                continue;
            }

            let flag = key.replace('_', "-");
            match value {
                Value::Bool(true) => command.push_str(&format!(" --{}", flag)),
                Value::Bool(false) | Value::Null => {}
                Value::String(s) => push_option(&mut command, &flag, s),
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    push_option(&mut command, &flag, &joined);
                }
                other => push_option(&mut command, &flag, &other.to_string()),
            }
        }
    }

    command.push_str(" --verbose");
    command
}
