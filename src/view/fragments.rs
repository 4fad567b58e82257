//! Per-repository extension fragments
//!
//! A repository can ship `<section>.before.yml` and `<section>.after.yml`
//! files to add steps at the start or end of an extendable section, plus
//! partials such as `addons.apt.packages.yml` that are inserted into the
//! generated `addons` block.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::sections::{EXTENSION_POINTS, PARTIALS};

/// Where a step fragment goes within its section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placement {
    Before,
    After,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Before => "before",
            Placement::After => "after",
        }
    }
}

/// Source of extension fragments, queried by section name
pub trait FragmentLookup {
    /// Step fragment for an extendable section
    fn fragment(&self, section: &str, placement: Placement) -> Option<&str>;

    /// Partial inserted into a generated section (e.g. `addons.apt.packages`)
    fn partial(&self, name: &str) -> Option<&str>;
}

/// Lookup that never has anything, used for core builds
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFragments;

impl FragmentLookup for NoFragments {
    fn fragment(&self, _section: &str, _placement: Placement) -> Option<&str> {
        None
    }

    fn partial(&self, _name: &str) -> Option<&str> {
        None
    }
}

/// Fragments held in memory, usually loaded from a repository directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    steps: BTreeMap<(String, Placement), String>,
    partials: BTreeMap<String, String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every known fragment file from `dir`. Missing files (or a
    /// missing directory) simply leave the fragment absent.
    pub fn load(dir: &Path) -> io::Result<Self> {
        let mut fragments = Self::new();

        for section in EXTENSION_POINTS {
            for placement in [Placement::Before, Placement::After] {
                let file = dir.join(format!("{}.{}.yml", section, placement.as_str()));
                if let Some(text) = read_optional(&file)? {
                    fragments.steps.insert((section.to_string(), placement), text);
                }
            }
        }

        for partial in PARTIALS {
            let file = dir.join(format!("{}.yml", partial));
            if let Some(text) = read_optional(&file)? {
                fragments.partials.insert(partial.to_string(), text);
            }
        }

        Ok(fragments)
    }

    pub fn with_step(
        mut self,
        section: impl Into<String>,
        placement: Placement,
        text: impl Into<String>,
    ) -> Self {
        self.steps.insert((section.into(), placement), text.into());
        self
    }

    pub fn with_partial(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.partials.insert(name.into(), text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.partials.is_empty()
    }

    /// Names of the loaded fragments, as their file stems
    /// (`install.before`, `addons.apt.packages`)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .steps
            .keys()
            .map(|(section, placement)| format!("{}.{}", section, placement.as_str()))
            .collect();
        names.extend(self.partials.keys().cloned());
        names
    }
}

impl FragmentLookup for Fragments {
    fn fragment(&self, section: &str, placement: Placement) -> Option<&str> {
        self.steps
            .get(&(section.to_string(), placement))
            .map(String::as_str)
    }

    fn partial(&self, name: &str) -> Option<&str> {
        self.partials.get(name).map(String::as_str)
    }
}

fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => {
            debug!("Loaded fragment {}", path.display());
            Ok(Some(text))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Normalize fragment text into block lines: outer whitespace trimmed,
/// leading whitespace of each line removed, blank lines dropped.
pub fn fragment_lines(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
