//! Merge generated values with an existing document
//!
//! `render` is a pure function of its inputs: no file system, network,
//! clock or logging. Callers read documents and fragments beforehand and
//! report on the returned [`Rendered`] afterwards.

use crate::document::{Document, Section};

use super::fragments::{fragment_lines, FragmentLookup, Placement};
use super::sections::{is_extension_point, output_order, SectionRole};
use super::values::{Block, GeneratedValues};

/// First line of every generated file
pub const HEADER: &str =
    "# do not edit this file manually, instead run the `travis-yml generate` command\n";

/// Result of a render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Final file contents
    pub text: String,

    /// Preserved sections taken from the existing document
    pub preserved: Vec<String>,

    /// Unknown sections copied through, in encountered order
    pub passthrough: Vec<String>,
}

/// Produce the final .travis.yml contents
pub fn render<F>(values: &GeneratedValues, existing: &Document, fragments: &F) -> Rendered
where
    F: FragmentLookup + ?Sized,
{
    let mut text = String::from(HEADER);
    let mut preserved = Vec::new();

    for name in output_order() {
        match SectionRole::of(name) {
            SectionRole::Preserved => {
                if let Some(section) = existing.get(name).filter(|s| !s.is_blank()) {
                    write_verbatim(section, &mut text);
                    preserved.push(name.to_string());
                } else if let Some(block) = values.get(name) {
                    block.write(name, &mut text);
                }
            }
            SectionRole::Generated => {
                let Some(block) = values.get(name) else {
                    continue;
                };
                if is_extension_point(name) {
                    splice(
                        block,
                        fragments.fragment(name, Placement::Before),
                        fragments.fragment(name, Placement::After),
                    )
                    .write(name, &mut text);
                } else {
                    block.write(name, &mut text);
                }
            }
            SectionRole::Passthrough => {}
        }
    }

    let passthrough = passthrough_names(existing);
    text.push_str(&passthrough_blob(existing));

    Rendered {
        text,
        preserved,
        passthrough,
    }
}

/// Wrap a block with before/after fragments. An absent fragment adds nothing.
pub fn splice(block: &Block, before: Option<&str>, after: Option<&str>) -> Block {
    if before.is_none() && after.is_none() {
        return block.clone();
    }

    let mut lines = before.map(fragment_lines).unwrap_or_default();
    lines.extend(block.to_lines());
    lines.extend(after.map(fragment_lines).unwrap_or_default());
    Block::Lines(lines)
}

/// Every passthrough section as `name:raw`, in encountered order
pub fn passthrough_blob(existing: &Document) -> String {
    let mut blob = String::new();
    for section in passthrough_sections(existing) {
        write_verbatim(section, &mut blob);
    }
    blob
}

fn passthrough_sections(existing: &Document) -> impl Iterator<Item = &Section> {
    existing
        .sections()
        .iter()
        .filter(|s| SectionRole::of(&s.name) == SectionRole::Passthrough)
}

fn passthrough_names(existing: &Document) -> Vec<String> {
    passthrough_sections(existing).map(|s| s.name.clone()).collect()
}

fn write_verbatim(section: &Section, out: &mut String) {
    out.push_str(&section.to_source());
    if !section.raw.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{self, Section};
    use crate::view::fragments::{Fragments, NoFragments};
    use crate::view::sections::{GENERATED_SECTIONS, PRESERVED_SECTIONS};

    fn generated() -> GeneratedValues {
        let mut values = GeneratedValues::new();
        for name in GENERATED_SECTIONS {
            values.set(*name, Block::list([format!("generated {}", name)]));
        }
        values
            .with("language", Block::scalar("php"))
            .with("sudo", Block::scalar("false"))
            .with("env", Block::lines(["global:", "  - DEFAULT_VAR=1"]))
            .with("matrix", Block::lines(["fast_finish: true"]))
    }

    #[test]
    fn test_empty_document_uses_generated_values() {
        let rendered = render(&generated(), &Document::empty(), &NoFragments);

        assert!(rendered.text.starts_with(HEADER));
        assert!(rendered.text.contains("language: php\n"));
        assert!(rendered.text.contains("install:\n  - generated install\n"));
        assert!(rendered.text.contains("env:\n  global:\n    - DEFAULT_VAR=1\n"));
        assert!(rendered.text.contains("matrix:\n  fast_finish: true\n"));
        assert!(rendered.preserved.is_empty());
        assert!(rendered.passthrough.is_empty());

        let reparsed = document::parse(&rendered.text).unwrap();
        for name in GENERATED_SECTIONS.iter().chain(PRESERVED_SECTIONS) {
            assert!(reparsed.contains(name), "missing section {}", name);
        }
    }

    #[test]
    fn test_existing_env_wins() {
        let existing = document::parse("env:\n  global:\n    - PRESERVED=1\n").unwrap();
        let rendered = render(&generated(), &existing, &NoFragments);

        assert!(rendered.text.contains("env:\n  global:\n    - PRESERVED=1\n"));
        assert!(!rendered.text.contains("DEFAULT_VAR=1"));
        assert_eq!(rendered.preserved, vec!["env"]);
        // matrix was absent, so its default is used
        assert!(rendered.text.contains("matrix:\n  fast_finish: true\n"));
    }

    #[test]
    fn test_blank_existing_env_is_regenerated() {
        let existing = Document::from_sections(vec![Section::new("env", "\n\n")]);
        let rendered = render(&generated(), &existing, &NoFragments);

        assert!(rendered.text.contains("DEFAULT_VAR=1"));
        assert!(rendered.preserved.is_empty());
    }

    #[test]
    fn test_generated_sections_are_never_merged() {
        let existing = document::parse("install:\n  - old step\nsudo: required\n").unwrap();
        let rendered = render(&generated(), &existing, &NoFragments);

        assert!(!rendered.text.contains("old step"));
        assert!(!rendered.text.contains("required"));
        assert!(rendered.passthrough.is_empty());
    }

    #[test]
    fn test_passthrough_in_encountered_order() {
        let existing = document::parse(
            "notifications:\n  # another section\n  - a\nlanguage: ruby\ncustom_section:\n  - kept\n",
        )
        .unwrap();
        let rendered = render(&generated(), &existing, &NoFragments);

        assert_eq!(rendered.passthrough, vec!["notifications", "custom_section"]);
        assert!(rendered
            .text
            .ends_with("notifications:\n  # another section\n  - a\ncustom_section:\n  - kept\n"));
        assert!(!rendered.text.contains("ruby"));
    }

    #[test]
    fn test_passthrough_blob_format() {
        let existing = Document::from_sections(vec![
            Section::new("a", " 1"),
            Section::new("env", "\n  - X=1\n"),
            Section::new("b", "\n  - two\n"),
        ]);
        assert_eq!(passthrough_blob(&existing), "a: 1\nb:\n  - two\n");
    }

    #[test]
    fn test_splice_wraps_body() {
        let block = Block::lines(["step 1", "step 2"]);
        let spliced = splice(&block, Some("step A"), Some("step B"));
        assert_eq!(spliced.body(), "step A\nstep 1\nstep 2\nstep B");
    }

    #[test]
    fn test_splice_without_fragments_is_noop() {
        let block = Block::lines(["step 1", "step 2"]);
        assert_eq!(splice(&block, None, None), block);
        assert_eq!(splice(&block, Some("  \n"), None).body(), "step 1\nstep 2");
    }

    #[test]
    fn test_render_splices_extension_points_only() {
        let fragments = Fragments::new()
            .with_step("install", Placement::Before, "- install hook line 1\n")
            .with_step("install", Placement::After, "- install hook line 2\n")
            .with_step("after_success", Placement::After, "- after_success hook\n");
        let rendered = render(&generated(), &Document::empty(), &fragments);

        assert!(rendered.text.contains(
            "install:\n  - install hook line 1\n  - generated install\n  - install hook line 2\n"
        ));
        assert!(rendered
            .text
            .contains("after_success:\n  - generated after_success\n  - after_success hook\n"));
        assert!(rendered.text.contains("before_install:\n  - generated before_install\n\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let existing = document::parse("custom:\n  - x\nenv:\n  - A=1\n").unwrap();
        let first = render(&generated(), &existing, &NoFragments);
        let second = render(&generated(), &existing, &NoFragments);
        assert_eq!(first, second);
    }

    #[test]
    fn test_preserved_sections_round_trip() {
        let existing = document::parse(
            "env:\n  global:\n    # keep me\n    - A=1\nmatrix:\n  exclude:\n    - php: 5.5\n",
        )
        .unwrap();
        let first = render(&generated(), &existing, &NoFragments);

        let reparsed = document::parse(&first.text).unwrap();
        for name in PRESERVED_SECTIONS {
            assert_eq!(reparsed.get(name), existing.get(name));
        }

        let second = render(&generated(), &reparsed, &NoFragments);
        assert_eq!(first.text, second.text);
    }
}
