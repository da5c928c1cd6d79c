//! model-annotations - IDE annotations for SilverStripe data models.
//!
//! Model classes declare their database fields and relations in static
//! configuration arrays, which IDEs cannot see. This crate reads that
//! configuration and adds matching `@property` / `@method` lines to each
//! model's class doc comment, leaving everything already documented alone.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis of PHP:
//!
//! - `php`: parsing and typed searches over the syntax tree
//! - `source`: a loaded file and the line-level edits applied to it
//! - `registry`: which classes are models and how they are configured
//! - `annotate`: descriptor generation, doc rendering and the per-class pipeline
//! - `runner`: a whole run over all target classes
//! - `config`: YAML configuration
//! - `report`: output formatting (pretty, JSON, quiet)

pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod php;
pub mod registry;
pub mod report;
pub mod runner;
pub mod source;

pub use annotate::{AnnotateOptions, Annotator, ClassOutcome, FieldFilter};
pub use config::AnnotateConfig;
pub use error::{AnnotateError, Result};
pub use registry::{ConfigKey, ConfigValue, ModelRegistry, ProjectRegistry};
pub use runner::{ClassReport, ClassStatus, RunSummary, Runner};
pub use source::SourceFile;
