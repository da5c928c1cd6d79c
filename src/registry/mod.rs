//! Model registry.
//!
//! The registry answers the questions the annotator has about a project:
//! which classes are models, whether a model is page-like, how a model's
//! fields and relations are configured and where its source file lives.
//!
//! [`ProjectRegistry`] builds these answers by statically scanning PHP
//! sources; anything implementing [`ModelRegistry`] can be plugged into the
//! annotator instead.

mod index;
mod scan;
mod value;

pub use index::{
    ModelClass, ProjectRegistry, RegistryOptions, DEFAULT_BASE_CLASS, DEFAULT_SITE_TREE_CLASS,
};
pub use value::{ConfigKey, ConfigValue, FieldConfig, DATA_LIST, HAS_MANY_LIST, MANY_MANY_LIST};

use std::path::PathBuf;

use crate::error::Result;

/// Read-only view of the project's models.
pub trait ModelRegistry {
    /// Fully-qualified names of the classes to annotate.
    ///
    /// With `filter` only the named class is returned, matched
    /// case-insensitively. A filter that names no model fails with
    /// [`crate::AnnotateError::ClassNotFound`].
    fn list_target_classes(&self, filter: Option<&str>) -> Result<Vec<String>>;

    /// Whether `fqn` descends from the framework's page base class.
    fn is_site_tree_like(&self, fqn: &str) -> bool;

    /// Configured fields of `fqn` under `key`, in declaration order.
    fn field_config(&self, fqn: &str, key: ConfigKey) -> FieldConfig;

    /// Source file declaring `fqn`.
    fn locate_source_file(&self, fqn: &str) -> Option<PathBuf>;

    /// Fully-qualified names of classes declared directly in `namespace`.
    fn classes_in_namespace(&self, namespace: &str) -> Vec<String>;
}
