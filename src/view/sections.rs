//! Section ownership rules
//!
//! Every top-level key of a .travis.yml falls into exactly one role:
//! - Generated: always rewritten from freshly computed values
//! - Preserved: kept verbatim from the existing file when present
//! - Passthrough: unknown to the generator, copied through unchanged

/// Sections the generator owns, in the order they are written out
pub const GENERATED_SECTIONS: &[&str] = &[
    "language",
    "php",
    "group",
    "services",
    "addons",
    "dist",
    "sudo",
    "script",
    "before_install",
    "install",
    "before_script",
    "after_script",
    "after_success",
];

/// Sections kept from an existing file, in output order
pub const PRESERVED_SECTIONS: &[&str] = &[ENV_SECTION, MATRIX_SECTION];

pub const ENV_SECTION: &str = "env";
pub const MATRIX_SECTION: &str = "matrix";

/// Generated sections that accept `<name>.before.yml` / `<name>.after.yml` steps
pub const EXTENSION_POINTS: &[&str] = &[
    "before_install",
    "install",
    "before_script",
    "after_script",
    "after_success",
];

/// Fragments inserted into the generated `addons` section
pub const PARTIALS: &[&str] = &[APT_SOURCES_PARTIAL, APT_PACKAGES_PARTIAL];

pub const APT_SOURCES_PARTIAL: &str = "addons.apt.sources";
pub const APT_PACKAGES_PARTIAL: &str = "addons.apt.packages";

/// Output order: generated sections up to `addons`, then env/matrix, then the rest
const PRESERVED_AFTER: &str = "addons";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRole {
    Generated,
    Preserved,
    Passthrough,
}

impl SectionRole {
    pub fn of(name: &str) -> Self {
        if PRESERVED_SECTIONS.contains(&name) {
            SectionRole::Preserved
        } else if GENERATED_SECTIONS.contains(&name) {
            SectionRole::Generated
        } else {
            SectionRole::Passthrough
        }
    }
}

pub fn is_extension_point(name: &str) -> bool {
    EXTENSION_POINTS.contains(&name)
}

/// Full output order of the known sections
pub fn output_order() -> Vec<&'static str> {
    let mut order = Vec::with_capacity(GENERATED_SECTIONS.len() + PRESERVED_SECTIONS.len());
    for name in GENERATED_SECTIONS {
        order.push(*name);
        if *name == PRESERVED_AFTER {
            order.extend_from_slice(PRESERVED_SECTIONS);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        assert_eq!(SectionRole::of("env"), SectionRole::Preserved);
        assert_eq!(SectionRole::of("matrix"), SectionRole::Preserved);
        assert_eq!(SectionRole::of("install"), SectionRole::Generated);
        assert_eq!(SectionRole::of("sudo"), SectionRole::Generated);
        assert_eq!(SectionRole::of("notifications"), SectionRole::Passthrough);
    }

    #[test]
    fn test_extension_points_are_generated() {
        for name in EXTENSION_POINTS {
            assert_eq!(SectionRole::of(name), SectionRole::Generated);
            assert!(is_extension_point(name));
        }
        assert!(!is_extension_point("script"));
    }

    #[test]
    fn test_output_order() {
        let order = output_order();
        assert_eq!(order.len(), GENERATED_SECTIONS.len() + 2);
        assert_eq!(&order[..7], &["language", "php", "group", "services", "addons", "env", "matrix"]);
        assert_eq!(order.last(), Some(&"after_success"));
    }
}
