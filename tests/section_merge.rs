//! Section merge behaviour through the public API

use travis_scripts::document::{self, Document};
use travis_scripts::view::{Placement, GENERATED_SECTIONS, PRESERVED_SECTIONS};
use travis_scripts::{render, Block, Fragments, GeneratedValues, NoFragments};

fn generated() -> GeneratedValues {
    let mut values = GeneratedValues::new();
    for name in GENERATED_SECTIONS {
        values.set(*name, Block::list([format!("{} step", name)]));
    }
    values
        .with("install", Block::lines(["- step 1", "- step 2"]))
        .with("env", Block::lines(["global:", "  - COMPUTED=1"]))
        .with("matrix", Block::lines(["fast_finish: true"]))
}

#[test]
fn test_custom_section_and_env_scenario() {
    let existing =
        document::parse("custom_section:\n  - kept\nenv:\n  global:\n    - PRESERVED=1").unwrap();
    let rendered = render(&generated(), &existing, &NoFragments);

    let output = document::parse(&rendered.text).unwrap();
    assert_eq!(output.get("env").unwrap().content(), "global:\n    - PRESERVED=1");
    assert!(!rendered.text.contains("COMPUTED=1"));
    assert!(rendered.text.contains("custom_section:\n  - kept\n"));
}

#[test]
fn test_preserved_sections_survive_rerender() {
    let existing = document::parse(
        "matrix:\n  allow_failures:\n    - php: 7.0\nenv:\n  - A=1\n  - B=2\n",
    )
    .unwrap();

    let first = render(&generated(), &existing, &NoFragments);
    let reparsed = document::parse(&first.text).unwrap();
    let second = render(&generated(), &reparsed, &NoFragments);

    for name in PRESERVED_SECTIONS {
        assert_eq!(
            document::parse(&second.text).unwrap().get(name).unwrap().content(),
            existing.get(name).unwrap().content()
        );
    }
    assert_eq!(first.text, second.text);
}

#[test]
fn test_empty_document_gets_every_section() {
    let rendered = render(&generated(), &Document::empty(), &NoFragments);
    let output = document::parse(&rendered.text).unwrap();

    for name in GENERATED_SECTIONS.iter().chain(PRESERVED_SECTIONS) {
        assert!(output.contains(name), "missing {}", name);
    }
    assert_eq!(output.get("env").unwrap().content(), "global:\n    - COMPUTED=1");
    assert!(rendered.passthrough.is_empty());
}

#[test]
fn test_extension_splicing() {
    let fragments = Fragments::new()
        .with_step("install", Placement::Before, "- step A\n")
        .with_step("install", Placement::After, "- step B\n");
    let rendered = render(&generated(), &Document::empty(), &fragments);

    let output = document::parse(&rendered.text).unwrap();
    assert_eq!(
        output.get("install").unwrap().content(),
        "- step A\n  - step 1\n  - step 2\n  - step B"
    );
}

#[test]
fn test_unknown_sections_keep_their_order() {
    let existing = document::parse(
        "zeta:\n  z: 1\nlanguage: ruby\nalpha:\n  # note\n  a: 1\ndeploy:\n  provider: script\n",
    )
    .unwrap();
    let rendered = render(&generated(), &existing, &NoFragments);

    assert_eq!(rendered.passthrough, vec!["zeta", "alpha", "deploy"]);
    assert!(rendered
        .text
        .ends_with("zeta:\n  z: 1\nalpha:\n  # note\n  a: 1\ndeploy:\n  provider: script\n"));
    assert!(rendered.text.contains("language:\n  - language step\n"));
    assert!(!rendered.text.contains("ruby"));
}

#[test]
fn test_unusual_key_spellings_survive_merge() {
    let existing = document::parse(
        "\u{feff}install:\n  - old\n\"notifications\":\n  email: false\nenv :\n  global:\n    - PRESERVED=1\n",
    )
    .unwrap();
    let rendered = render(&generated(), &existing, &NoFragments);

    assert_eq!(rendered.preserved, vec!["env"]);
    assert_eq!(rendered.passthrough, vec!["notifications"]);
    assert!(rendered.text.contains("    - PRESERVED=1\n"));
    assert!(rendered.text.ends_with("notifications:\n  email: false\n"));
    assert!(!rendered.text.contains("- old"));
}

#[test]
fn test_flow_style_env_is_preserved() {
    let existing = document::parse("{env: {global: [PRESERVED=1]}, custom: 1}").unwrap();
    let rendered = render(&generated(), &existing, &NoFragments);

    assert_eq!(rendered.preserved, vec!["env"]);
    assert_eq!(rendered.passthrough, vec!["custom"]);
    assert!(!rendered.text.contains("COMPUTED=1"));

    let output = document::parse(&rendered.text).unwrap();
    assert_eq!(output.get("env").unwrap().content(), "global:\n  - PRESERVED=1");
    assert_eq!(output.get("custom").unwrap().content(), "1");
}

#[test]
fn test_existing_dist_is_replaced() {
    let existing = document::parse("dist: xenial\nsudo: required\n").unwrap();
    let values = generated().with("dist", Block::scalar("trusty"));
    let rendered = render(&values, &existing, &NoFragments);

    let output = document::parse(&rendered.text).unwrap();
    assert_eq!(output.get("dist").unwrap().content(), "trusty");
    assert!(!rendered.text.contains("xenial"));
    assert!(rendered.passthrough.is_empty());
}
