//! .travis.yml view
//!
//! Combines freshly generated section bodies with an existing document:
//! generator-owned sections are rewritten, `env` and `matrix` are kept
//! when the existing file has them, and unknown sections pass through.

mod fragments;
mod render;
mod sections;
mod values;

pub use fragments::{fragment_lines, FragmentLookup, Fragments, NoFragments, Placement};
pub use render::{passthrough_blob, render, splice, Rendered, HEADER};
pub use sections::{
    is_extension_point, output_order, SectionRole, APT_PACKAGES_PARTIAL, APT_SOURCES_PARTIAL,
    ENV_SECTION, EXTENSION_POINTS, GENERATED_SECTIONS, MATRIX_SECTION, PARTIALS,
    PRESERVED_SECTIONS,
};
pub use values::{Block, GeneratedValues};
