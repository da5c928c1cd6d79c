//! Run configuration for model-annotations.
//!
//! Configuration is read from a YAML file whose keys follow the framework's
//! own names (`dryRun`, `addUseStatements`, ...). Every key is optional;
//! missing keys take the defaults below. Command-line flags are applied on
//! top of the file by the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::annotate::{AnnotateOptions, FieldFilter};
use crate::error::{AnnotateError, Result};
use crate::registry::{RegistryOptions, DEFAULT_BASE_CLASS, DEFAULT_SITE_TREE_CLASS};

/// Config file names searched for when none is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["model-annotations.yaml", ".model-annotations.yaml"];

/// Fields every page inherits from the framework's page class.
pub const DEFAULT_SITE_TREE_FIELDS: &[&str] = &[
    "URLSegment",
    "Title",
    "MenuTitle",
    "Content",
    "MetaDescription",
    "ExtraMeta",
    "ReportClass",
    "Sort",
    "ShowInMenus",
    "ShowInSearch",
    "HasBrokenFile",
    "HasBrokenLink",
    "ViewerGroups",
    "EditorGroups",
    "Parent",
    "BackLinks",
    "VirtualPages",
];

/// Fields that are never annotated.
pub const DEFAULT_IGNORE_FIELDS: &[&str] = &["LinkTracking", "FileTracking"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotateConfig {
    /// Annotate only this class.
    pub data_class: Option<String>,
    /// Print results instead of writing files.
    pub dry_run: bool,
    pub add_use_statements: bool,
    pub create_backup_file: bool,
    /// Suppress presentation output.
    pub quiet: bool,
    pub site_tree_fields: Vec<String>,
    pub ignore_fields: Vec<String>,
    /// Glob patterns, relative to the project root, that are never scanned.
    pub excluded_paths: Vec<String>,
    pub include_vendor: bool,
    pub base_class: String,
    pub site_tree_class: String,
    /// Whether a model's configuration includes what its ancestors declare.
    pub inherit_config: bool,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            data_class: None,
            dry_run: true,
            add_use_statements: false,
            create_backup_file: false,
            quiet: false,
            site_tree_fields: to_strings(DEFAULT_SITE_TREE_FIELDS),
            ignore_fields: to_strings(DEFAULT_IGNORE_FIELDS),
            excluded_paths: Vec::new(),
            include_vendor: false,
            base_class: DEFAULT_BASE_CLASS.to_string(),
            site_tree_class: DEFAULT_SITE_TREE_CLASS.to_string(),
            inherit_config: true,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl AnnotateConfig {
    /// Parse configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| AnnotateError::io(path, e))?;
        Self::parse_str(&content)
            .map_err(|e| AnnotateError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn parse_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn field_filter(&self) -> FieldFilter {
        FieldFilter::new(self.site_tree_fields.clone(), self.ignore_fields.clone())
    }

    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            dry_run: self.dry_run,
            add_use_statements: self.add_use_statements,
            create_backup_file: self.create_backup_file,
        }
    }

    pub fn registry_options(&self) -> Result<RegistryOptions> {
        Ok(RegistryOptions {
            base_class: self.base_class.clone(),
            site_tree_class: self.site_tree_class.clone(),
            inherit_config: self.inherit_config,
            include_vendor: self.include_vendor,
            excluded_paths: self.excluded_globs()?,
        })
    }

    /// Compile `excluded_paths` into one matcher.
    pub fn excluded_globs(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                AnnotateError::Config(format!("invalid excludedPaths pattern {:?}: {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| AnnotateError::Config(format!("invalid excludedPaths: {}", e)))
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &AnnotateConfig) -> Result<()> {
    if config.base_class.trim().is_empty() {
        return Err(AnnotateError::Config("baseClass must not be empty".to_string()));
    }
    if config.site_tree_class.trim().is_empty() {
        return Err(AnnotateError::Config("siteTreeClass must not be empty".to_string()));
    }
    if let Some(class) = &config.data_class {
        if class.trim().is_empty() {
            return Err(AnnotateError::Config("dataClass must not be empty".to_string()));
        }
    }

    config.excluded_globs()?;
    Ok(())
}
