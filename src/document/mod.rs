//! Existing .travis.yml documents
//!
//! A document is the ordered list of top-level sections found in a
//! previously generated (and possibly hand-edited) `.travis.yml`. Section
//! bodies are kept as raw text so that comments and layout survive a
//! regeneration untouched.

mod parser;

pub use parser::{parse, read};

/// Errors raised while loading an existing document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in existing document: {0}")]
    Parse(String),
}

/// A top-level section of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Key of the section (e.g. `env`)
    pub name: String,

    /// Everything after `name:` up to the next top-level key, verbatim
    pub raw: String,
}

impl Section {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
        }
    }

    /// Body with the surrounding whitespace removed
    pub fn content(&self) -> &str {
        self.raw.trim()
    }

    /// True if the body holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.content().is_empty()
    }

    /// The section as it appeared in the source, `name:` included
    pub fn to_source(&self) -> String {
        format!("{}:{}", yaml_key(&self.name), self.raw)
    }
}

/// `name` as a key line spells it, quoted unless it is a simple word
fn yaml_key(name: &str) -> String {
    let simple = name.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));
    if simple {
        return name.to_string();
    }

    let escaped = name
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t");
    format!("\"{}\"", escaped)
}

/// An existing document, read-only once parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,

    /// SHA-256 of the file the document was read from
    digest: Option<String>,
}

impl Document {
    /// The document used when no previous file exists
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self {
            sections,
            digest: None,
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Sections in the order they were encountered
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_content_trims_layout() {
        let section = Section::new("env", "\n  global:\n    - PRESERVED=1\n\n");
        assert_eq!(section.content(), "global:\n    - PRESERVED=1");
        assert!(!section.is_blank());
    }

    #[test]
    fn test_blank_section() {
        let section = Section::new("env", "\n   \n");
        assert!(section.is_blank());
    }

    #[test]
    fn test_to_source() {
        let section = Section::new("language", " php\n");
        assert_eq!(section.to_source(), "language: php\n");
    }

    #[test]
    fn test_to_source_quotes_unusual_keys() {
        assert_eq!(Section::new("a b", " 1\n").to_source(), "\"a b\": 1\n");
        assert_eq!(Section::new("x: \"y\"", " 1\n").to_source(), "\"x: \\\"y\\\"\": 1\n");
        assert_eq!(Section::new("before_install", " 1\n").to_source(), "before_install: 1\n");
    }

    #[test]
    fn test_lookup_keeps_order() {
        let doc = Document::from_sections(vec![
            Section::new("b", " 1\n"),
            Section::new("a", " 2\n"),
        ]);

        assert_eq!(doc.names(), vec!["b", "a"]);
        assert_eq!(doc.get("a").unwrap().raw, " 2\n");
        assert!(!doc.contains("c"));
        assert_eq!(doc.len(), 2);
    }
}
