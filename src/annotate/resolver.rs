//! Shortening of type names against a file's imports.
//!
//! A type is written in the shortest form that still resolves to the same
//! class in the file being annotated. When nothing makes the short form
//! valid, the root-qualified name is used instead (`\Foo\Bar`), unless the
//! caller asked for missing imports to be collected.

use crate::php::names::{self, ImportedName};
use crate::php::tree::{ImportKind, ImportStatement};

/// Result of shortening a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    /// The name to print in documentation.
    pub resolved: String,
    /// Fully-qualified name that needs a new `use` statement for `resolved`
    /// to be valid.
    pub new_import: Option<String>,
}

impl Shortened {
    pub fn is_new_unused_import(&self) -> bool {
        self.new_import.is_some()
    }
}

/// File context used when shortening type names.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    imports: Vec<ImportStatement>,
    classes_in_same_namespace: Vec<String>,
    collect_unused: bool,
}

impl TypeResolver {
    pub fn new(
        imports: Vec<ImportStatement>,
        classes_in_same_namespace: Vec<String>,
        collect_unused: bool,
    ) -> Self {
        Self {
            imports: imports
                .into_iter()
                .filter(|i| i.kind == ImportKind::Class)
                .collect(),
            classes_in_same_namespace,
            collect_unused,
        }
    }

    /// Shorten `data_type` for use in the current file.
    ///
    /// Dotted field paths (`App\Team.Players`) are cut at the first `.`.
    /// The short name is used when the type is imported, lives in the same
    /// namespace, or missing imports are being collected. In the last case
    /// the type is reported through [`Shortened::new_import`].
    pub fn shorten(&self, data_type: &str) -> Shortened {
        let data_type = match data_type.find('.') {
            Some(pos) if pos > 0 => &data_type[..pos],
            _ => data_type,
        };
        let data_type = names::strip_root(data_type);
        let short_name = names::short_name(data_type);

        let import = self
            .imports
            .iter()
            .find(|i| i.imported_name == data_type || i.alias.as_deref() == Some(data_type));
        let in_same_namespace = self.classes_in_same_namespace.iter().any(|c| c == data_type);

        if let Some(import) = import {
            return Shortened {
                resolved: import.local_name().to_string(),
                new_import: None,
            };
        }

        if in_same_namespace {
            return Shortened {
                resolved: short_name.to_string(),
                new_import: None,
            };
        }

        if self.collect_unused {
            return Shortened {
                resolved: short_name.to_string(),
                new_import: Some(data_type.to_string()),
            };
        }

        Shortened {
            resolved: names::root_qualified(data_type),
            new_import: None,
        }
    }
}
