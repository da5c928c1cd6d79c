//! Annotation generation.
//!
//! - `engine`: the per-class pipeline ([`Annotator`])
//! - `doc`: descriptors and doc comment rendering
//! - `resolver`: shortening type names against a file's imports
//! - `types`: database field spec to PHP type mapping
//! - `filter`: fields that are never annotated

pub mod doc;
pub mod engine;
pub mod filter;
pub mod resolver;
pub mod types;

pub use doc::{humanize, DescriptorKind, DocBlock, FieldDescriptor};
pub use engine::{AnnotateOptions, Annotator, ClassOutcome, Stage};
pub use filter::FieldFilter;
pub use resolver::{Shortened, TypeResolver};
pub use types::php_type_for;
