//! Machine-readable reports of a generation run

mod generation;

pub use generation::{GenerationSummary, GENERATION_SUMMARY_SCHEMA_ID, GENERATION_SUMMARY_SCHEMA_VERSION};
