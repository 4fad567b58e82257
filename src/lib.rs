//! travis-scripts - .travis.yml generation for the analytics platform
//!
//! Generates the `.travis.yml` of the platform, of its plugins and of the
//! tests-plugins repository. Hand-maintained `env`, `matrix` and unknown
//! sections of an existing file survive regeneration.

pub mod config;
pub mod document;
pub mod generator;
pub mod summary;
pub mod view;

pub use config::{ConfigError, EffectiveSettings, GeneratorSettings};
pub use document::{Document, DocumentError, Section};
pub use generator::{GenerateError, GenerateOptions, Generation, Generator, Target};
pub use summary::GenerationSummary;
pub use view::{render, Block, FragmentLookup, Fragments, GeneratedValues, NoFragments, Rendered};
