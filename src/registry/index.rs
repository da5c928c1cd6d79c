//! Class index built from a project scan.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use indexmap::IndexMap;

use super::value::{ConfigKey, FieldConfig};
use super::{scan, ModelRegistry};
use crate::error::{AnnotateError, Result};
use crate::php::names;

/// Default model base class.
pub const DEFAULT_BASE_CLASS: &str = "SilverStripe\\ORM\\DataObject";
/// Default page base class.
pub const DEFAULT_SITE_TREE_CLASS: &str = "SilverStripe\\CMS\\Model\\SiteTree";

/// A class declaration found while scanning.
#[derive(Debug, Clone)]
pub struct ModelClass {
    pub fqn: String,
    /// Fully-qualified parent class, resolved against the file's imports.
    pub parent: Option<String>,
    pub is_abstract: bool,
    pub path: PathBuf,
    /// Static configuration arrays declared on the class itself.
    pub config: IndexMap<ConfigKey, FieldConfig>,
}

impl ModelClass {
    pub fn new(fqn: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            fqn: names::strip_root(&fqn.into()).to_string(),
            parent: None,
            is_abstract: false,
            path: path.into(),
            config: IndexMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(names::strip_root(&parent.into()).to_string());
        self
    }

    pub fn with_config(mut self, key: ConfigKey, fields: FieldConfig) -> Self {
        self.config.insert(key, fields);
        self
    }
}

/// How the registry decides which classes are models.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub base_class: String,
    pub site_tree_class: String,
    /// Merge ancestor configuration into a class's own.
    pub inherit_config: bool,
    pub include_vendor: bool,
    /// Paths (relative to the scan root) that are never scanned.
    pub excluded_paths: GlobSet,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            base_class: DEFAULT_BASE_CLASS.to_string(),
            site_tree_class: DEFAULT_SITE_TREE_CLASS.to_string(),
            inherit_config: true,
            include_vendor: false,
            excluded_paths: GlobSet::empty(),
        }
    }
}

/// Registry over the classes of a scanned project.
#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    options: RegistryOptions,
    /// Keyed by lower-cased FQN; PHP class names are case-insensitive.
    classes: IndexMap<String, ModelClass>,
}

impl ProjectRegistry {
    /// Scan every PHP file under `root`.
    pub fn scan(root: &Path, options: RegistryOptions) -> Result<Self> {
        let classes = scan::scan_project(root, &options)?;
        Ok(Self::from_classes(classes, options))
    }

    /// Build a registry from already known classes.
    ///
    /// When a class is declared more than once the first declaration is kept.
    pub fn from_classes(classes: impl IntoIterator<Item = ModelClass>, options: RegistryOptions) -> Self {
        let mut index: IndexMap<String, ModelClass> = IndexMap::new();
        for class in classes {
            let key = class.fqn.to_ascii_lowercase();
            if let Some(existing) = index.get(&key) {
                tracing::warn!(
                    class = %class.fqn,
                    kept = %existing.path.display(),
                    ignored = %class.path.display(),
                    "class declared more than once"
                );
                continue;
            }
            index.insert(key, class);
        }

        Self {
            options,
            classes: index,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, fqn: &str) -> Option<&ModelClass> {
        self.classes.get(&names::strip_root(fqn).to_ascii_lowercase())
    }

    /// Parent names of `fqn`, nearest first.
    ///
    /// The chain continues through classes the scan knows and ends at the
    /// first parent it doesn't, which is still included.
    pub fn ancestors(&self, fqn: &str) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = self.class(fqn);

        while let Some(class) = current {
            let Some(parent) = class.parent.as_deref() else {
                break;
            };
            // inheritance cycles only occur in broken code
            if chain.iter().any(|c| names::same_class(c, parent)) || names::same_class(parent, fqn) {
                break;
            }
            chain.push(parent.to_string());
            current = self.class(parent);
        }

        chain
    }

    /// Whether `ancestor` appears in the parent chain of `fqn`.
    pub fn extends(&self, fqn: &str, ancestor: &str) -> bool {
        self.ancestors(fqn).iter().any(|a| names::same_class(a, ancestor))
    }

    /// Whether `fqn` is a model class (abstract or not).
    pub fn is_model(&self, fqn: &str) -> bool {
        self.extends(fqn, &self.options.base_class) || self.extends(fqn, &self.options.site_tree_class)
    }

    fn targets(&self) -> Vec<&ModelClass> {
        let mut targets: Vec<&ModelClass> = self
            .classes
            .values()
            .filter(|c| !c.is_abstract && self.is_model(&c.fqn))
            .collect();
        targets.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        targets
    }
}

impl ModelRegistry for ProjectRegistry {
    fn list_target_classes(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let targets = self.targets();

        match filter {
            None => Ok(targets.into_iter().map(|c| c.fqn.clone()).collect()),
            Some(name) => targets
                .into_iter()
                .find(|c| names::same_class(&c.fqn, name))
                .map(|c| vec![c.fqn.clone()])
                .ok_or_else(|| AnnotateError::ClassNotFound(name.to_string())),
        }
    }

    fn is_site_tree_like(&self, fqn: &str) -> bool {
        self.extends(fqn, &self.options.site_tree_class)
    }

    fn field_config(&self, fqn: &str, key: ConfigKey) -> FieldConfig {
        let mut lineage: Vec<&ModelClass> = Vec::new();
        if self.options.inherit_config {
            lineage.extend(self.ancestors(fqn).iter().rev().filter_map(|a| self.class(a)));
        }
        lineage.extend(self.class(fqn));

        let mut merged = FieldConfig::new();
        for class in lineage {
            if let Some(fields) = class.config.get(&key) {
                for (name, value) in fields {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }
        merged
    }

    fn locate_source_file(&self, fqn: &str) -> Option<PathBuf> {
        self.class(fqn).map(|c| c.path.clone())
    }

    fn classes_in_namespace(&self, namespace: &str) -> Vec<String> {
        let namespace = names::strip_root(namespace);
        self.classes
            .values()
            .filter(|c| names::namespace_of(&c.fqn).eq_ignore_ascii_case(namespace))
            .map(|c| c.fqn.clone())
            .collect()
    }
}
