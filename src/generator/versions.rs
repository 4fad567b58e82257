//! Version ordering for PHP versions and release tags

use regex_lite::Regex;
use std::cmp::Ordering;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::info;

/// Patch-level PHP versions known to be installable on travis as-is
pub const KNOWN_PATCH_VERSIONS: &[&str] = &[];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Word(String),
}

impl Segment {
    /// Ordering rank: dev < alpha < beta < RC < number < pl. Unknown words sort first.
    fn rank(&self) -> i8 {
        match self {
            Segment::Number(_) => 4,
            Segment::Word(w) => match w.to_ascii_lowercase().as_str() {
                "dev" => 0,
                "alpha" | "a" => 1,
                "beta" | "b" => 2,
                "rc" => 3,
                "pl" | "p" => 5,
                _ => -1,
            },
        }
    }
}

fn flush(current: &mut String, out: &mut Vec<Segment>) {
    if current.is_empty() {
        return;
    }
    let segment = match current.parse::<u64>() {
        Ok(n) => Segment::Number(n),
        Err(_) => Segment::Word(current.clone()),
    };
    out.push(segment);
    current.clear();
}

/// Split into runs of digits and runs of other characters
fn segments(version: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();

    for c in version.trim().chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, &mut out);
            continue;
        }
        let switches_kind = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != c.is_ascii_digit());
        if switches_kind {
            flush(&mut current, &mut out);
        }
        current.push(c);
    }
    flush(&mut current, &mut out);

    out
}

/// Compare two version strings, `1.0.0-b1 < 1.0.0 < 1.0.0.1`
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for i in 0..left.len().max(right.len()) {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(Segment::Number(x)), Some(Segment::Number(y))) => x.cmp(y),
            (Some(x), Some(y)) => x.rank().cmp(&y.rank()),
            // "1.0" < "1.0.0", but "1.0.0" > "1.0.0-b1"
            (None, Some(Segment::Number(_))) => Ordering::Less,
            (Some(Segment::Number(_)), None) => Ordering::Greater,
            (None, Some(word)) => 4.cmp(&word.rank()),
            (Some(word), None) => word.rank().cmp(&4),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Lowest version of the list
pub fn minimum_version(versions: &[String]) -> Option<&String> {
    versions.iter().min_by(|a, b| compare_versions(a, b))
}

/// Reduce `x.y.z` to `x.y` unless travis is known to provide that exact patch release
pub fn version_known_on_travis(version: &str) -> String {
    if KNOWN_PATCH_VERSIONS.contains(&version) || version.matches('.').count() < 2 {
        return version.to_string();
    }

    let without_patch = version.splitn(3, '.').take(2).collect::<Vec<_>>().join(".");
    info!(
        "Version '{}' is not known to be available on travis, using '{}'.",
        version, without_patch
    );
    without_patch
}

fn release_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+").expect("valid release tag pattern"))
}

/// Highest release-looking tag among `git tag -l` output lines
pub fn latest_release_tag(tags: &str) -> Option<String> {
    tags.lines()
        .map(str::trim)
        .filter(|tag| release_tag_pattern().is_match(tag))
        .max_by(|a, b| compare_versions(a, b))
        .map(str::to_string)
}

/// Ask git for the tags of the repository at `root` and pick the latest release
pub fn latest_stable_from_git(root: &Path) -> Option<String> {
    info!("Listing tags of {} to find latest stable...", root.display());

    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["tag", "-l"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            latest_release_tag(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            info!(
                "git tag -l failed in {}: {}",
                root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            info!("Cannot run git in {}: {}", root.display(), e);
            None
        }
    }
}
