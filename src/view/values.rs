//! Freshly computed section bodies

use std::collections::BTreeMap;

/// Body of a generated section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Written inline: `name: value`
    Scalar(String),

    /// Written below the key, each line indented by two spaces.
    /// Lines are relative to the section's own indentation.
    Lines(Vec<String>),
}

impl Block {
    pub fn scalar(value: impl Into<String>) -> Self {
        Block::Scalar(value.into())
    }

    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Block::Lines(lines.into_iter().map(Into::into).collect())
    }

    /// A YAML sequence, one `- item` line per entry
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Block::Lines(
            items
                .into_iter()
                .map(|item| format!("- {}", item.as_ref()))
                .collect(),
        )
    }

    /// The body as lines, without indentation
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            Block::Scalar(value) => vec![value.clone()],
            Block::Lines(lines) => lines.clone(),
        }
    }

    /// The body joined with newlines, without indentation
    pub fn body(&self) -> String {
        self.to_lines().join("\n")
    }

    /// Append `name:` and the body to `out`, followed by a blank line
    pub fn write(&self, name: &str, out: &mut String) {
        match self {
            Block::Scalar(value) => {
                out.push_str(name);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
            Block::Lines(lines) => {
                out.push_str(name);
                out.push_str(":\n");
                for line in lines {
                    if !line.is_empty() {
                        out.push_str("  ");
                        out.push_str(line);
                    }
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }
}

/// Section name to computed body, for generated sections and the
/// defaults of the preserved ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedValues {
    sections: BTreeMap<String, Block>,
}

impl GeneratedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, block: Block) -> &mut Self {
        self.sections.insert(name.into(), block);
        self
    }

    pub fn with(mut self, name: impl Into<String>, block: Block) -> Self {
        self.set(name, block);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Block> {
        self.sections.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}
