//! Splits an existing .travis.yml into raw top-level sections
//!
//! The whole file is parsed with a real YAML parser first and the keys of
//! its top-level mapping are the authoritative section list. Section bodies
//! are never reinterpreted: a section runs from the text after `name:` up to
//! the next top-level key line. If the key lines found in the text do not
//! match the mapping keys the document is rejected rather than losing a
//! section.

use regex_lite::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use super::{Document, DocumentError, Section};

const BOM: char = '\u{feff}';

/// A top-level key line: plain, `"double"` or `'single'` quoted key,
/// optional blanks, then `:` followed by a blank or the end of the line
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"^(?:"((?:[^"\\]|\\.)*)"|'((?:[^']|'')*)'|([^\s#'"{}\[\],&*!|>%@`?:-][^:#]*?|-[^\s:#][^:#]*?))[ \t]*:(\s|$)"#,
        )
        .expect("valid top-level key pattern")
    })
}

/// Read a document from disk, keeping the digest of its contents.
/// A missing file is an empty document.
pub fn read(path: &Path) -> Result<Document, DocumentError> {
    if !path.exists() {
        return Ok(Document::empty());
    }

    let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    Ok(parse(&text)?.with_digest(digest))
}

/// Parse document text into its top-level sections
pub fn parse(text: &str) -> Result<Document, DocumentError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if !has_content(text) {
        return Ok(Document::empty());
    }

    let Some(mapping) = parse_mapping(text)? else {
        return Ok(Document::empty());
    };
    let keys = mapping_keys(&mapping)?;

    let sections = split_sections(text);
    if sections.is_empty() && !keys.is_empty() && is_flow_mapping(text) {
        return Ok(Document::from_sections(flow_sections(&mapping)?));
    }

    let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
    if names != keys.iter().map(String::as_str).collect::<Vec<_>>() {
        return Err(DocumentError::Parse(format!(
            "cannot locate every top-level key: the document defines [{}] but key lines were found for [{}]",
            keys.join(", "),
            names.join(", ")
        )));
    }

    Ok(Document::from_sections(sections))
}

/// False for files holding only blank lines and comments
fn has_content(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    })
}

fn parse_mapping(text: &str) -> Result<Option<Mapping>, DocumentError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(Some(mapping)),
        Value::Null => Ok(None),
        other => Err(DocumentError::Parse(format!(
            "top level must be a mapping, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Top-level keys in document order, as the text a key line spells them
fn mapping_keys(mapping: &Mapping) -> Result<Vec<String>, DocumentError> {
    mapping
        .keys()
        .map(|key| match key {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(DocumentError::Parse(format!(
                "unsupported top-level key: {}",
                value_kind(other)
            ))),
        })
        .collect()
}

fn is_flow_mapping(text: &str) -> bool {
    text.lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with('#') && *line != "---")
        .is_some_and(|line| line.starts_with('{'))
}

/// Sections of a `{key: value, ...}` document, each value re-emitted in block style
fn flow_sections(mapping: &Mapping) -> Result<Vec<Section>, DocumentError> {
    let keys = mapping_keys(mapping)?;
    keys.into_iter()
        .zip(mapping.values())
        .map(|(name, value)| Ok(Section::new(name, block_body(value)?)))
        .collect()
}

fn block_body(value: &Value) -> Result<String, DocumentError> {
    let emitted = serde_yaml::to_string(value).map_err(|e| DocumentError::Parse(e.to_string()))?;
    let mut lines = emitted.trim_end().lines();
    let collection = match value {
        Value::Mapping(m) => !m.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        _ => false,
    };

    let mut raw = String::new();
    if !collection {
        raw.push(' ');
        raw.push_str(lines.next().unwrap_or_default());
    }
    for line in lines {
        raw.push_str("\n  ");
        raw.push_str(line);
    }
    raw.push('\n');
    Ok(raw)
}

fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in text.split_inclusive('\n') {
        if let Some((name, rest)) = top_level_key(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(Section::new(name, rest));
        } else if let Some(section) = current.as_mut() {
            section.raw.push_str(line);
        }
        // Lines before the first key (header comments, `---`) belong to no section
    }

    sections.extend(current);
    sections
}

fn top_level_key(line: &str) -> Option<(String, &str)> {
    let captures = key_pattern().captures(line)?;
    let name = key_name(&captures)?;
    // Everything after the ':'
    let colon = captures.get(4)?.start();
    Some((name, &line[colon..]))
}

fn key_name(captures: &Captures) -> Option<String> {
    if let Some(double) = captures.get(1) {
        return Some(unescape_double_quoted(double.as_str()));
    }
    if let Some(single) = captures.get(2) {
        return Some(single.as_str().replace("''", "'"));
    }
    captures.get(3).map(|plain| plain.as_str().trim_end().to_string())
}

fn unescape_double_quoted(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING: &str = "\
# header comment, not part of any section
language: php

custom_section:
  - this will be preserved
  # as should this

env:
  global:
    - PRESERVED_VAR=123
    - secure: anotherpreservedvar

notifications:
  # another section
  - a
  - b
  - c
";

    #[test]
    fn test_sections_in_order() {
        let doc = parse(EXISTING).unwrap();
        assert_eq!(
            doc.names(),
            vec!["language", "custom_section", "env", "notifications"]
        );
    }

    #[test]
    fn test_raw_bodies_are_verbatim() {
        let doc = parse(EXISTING).unwrap();

        assert_eq!(doc.get("language").unwrap().raw, " php\n\n");
        assert_eq!(
            doc.get("custom_section").unwrap().raw,
            "\n  - this will be preserved\n  # as should this\n\n"
        );
        assert_eq!(
            doc.get("notifications").unwrap().to_source(),
            "notifications:\n  # another section\n  - a\n  - b\n  - c\n"
        );
    }

    #[test]
    fn test_env_content() {
        let doc = parse(EXISTING).unwrap();
        assert_eq!(
            doc.get("env").unwrap().content(),
            "global:\n    - PRESERVED_VAR=123\n    - secure: anotherpreservedvar"
        );
    }

    #[test]
    fn test_column_zero_lines_stay_in_section() {
        let text = "script:\n- one\n# trailing note\n- two\nsudo: false\n";
        let doc = parse(text).unwrap();

        assert_eq!(doc.get("script").unwrap().raw, "\n- one\n# trailing note\n- two\n");
        assert_eq!(doc.get("sudo").unwrap().raw, " false\n");
    }

    #[test]
    fn test_last_section_without_newline() {
        let doc = parse("a: 1\nb: 2").unwrap();
        assert_eq!(doc.get("b").unwrap().raw, " 2");
    }

    #[test]
    fn test_nested_keys_are_not_sections() {
        let doc = parse("matrix:\n  exclude:\n    - php: 5.5\n").unwrap();
        assert_eq!(doc.names(), vec!["matrix"]);
    }

    #[test]
    fn test_empty_and_comment_only_text() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let result = parse("env:\n  global: [unclosed\nsudo: false\n");
        assert!(matches!(result, Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_non_mapping_top_level_is_rejected() {
        let err = parse("- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn test_unknown_sections_are_accepted() {
        let doc = parse("whatever_this_is:\n  nested:\n    deeply: true\n").unwrap();
        assert!(doc.contains("whatever_this_is"));
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = read(&dir.path().join(".travis.yml")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".travis.yml");
        fs::write(&path, EXISTING).unwrap();

        let doc = read(&path).unwrap();
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_quoted_keys() {
        let doc = parse("install:\n  - old\n\"notifications\":\n  email: false\n'env':\n  - A=1\n").unwrap();

        assert_eq!(doc.names(), vec!["install", "notifications", "env"]);
        assert_eq!(doc.get("install").unwrap().raw, "\n  - old\n");
        assert_eq!(doc.get("notifications").unwrap().content(), "email: false");
        assert_eq!(doc.get("env").unwrap().content(), "- A=1");
    }

    #[test]
    fn test_blank_before_colon() {
        let doc = parse("language: php\nenv :\n  global:\n    - PRESERVED=1\n").unwrap();

        assert_eq!(doc.names(), vec!["language", "env"]);
        assert_eq!(doc.get("env").unwrap().content(), "global:\n    - PRESERVED=1");
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let doc = parse("\u{feff}env:\n  global:\n    - PRESERVED=1\nsudo: false\n").unwrap();

        assert_eq!(doc.names(), vec!["env", "sudo"]);
        assert_eq!(doc.get("env").unwrap().content(), "global:\n    - PRESERVED=1");
    }

    #[test]
    fn test_flow_style_document() {
        let doc = parse("{env: {global: [PRESERVED=1]}, custom: 1}").unwrap();

        assert_eq!(doc.names(), vec!["env", "custom"]);
        assert_eq!(doc.get("env").unwrap().content(), "global:\n  - PRESERVED=1");
        assert_eq!(doc.get("custom").unwrap().raw, " 1\n");

        // the re-emitted sections read back the same
        let source: String = doc.sections().iter().map(Section::to_source).collect();
        assert_eq!(parse(&source).unwrap().sections(), doc.sections());
    }

    #[test]
    fn test_unlocatable_key_is_rejected() {
        let err = parse("language: php\n? [complex, key]\n: value\n").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn test_read_records_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".travis.yml");
        fs::write(&path, "sudo: false\n").unwrap();

        let digest = read(&path).unwrap().digest().unwrap().to_string();
        assert_eq!(digest.len(), 64);
        assert!(parse("sudo: false\n").unwrap().digest().is_none());

        fs::write(&path, "sudo: required\n").unwrap();
        assert_ne!(read(&path).unwrap().digest(), Some(digest.as_str()));
    }
}
