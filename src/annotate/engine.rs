//! Per-class annotation pipeline.
//!
//! For one model class the [`Annotator`] loads the declaring file, collects
//! a descriptor for every configured field, drops excluded and already
//! documented ones, renders the remainder into the class doc comment, adds
//! any `use` statements the new lines need and, unless running dry, writes
//! the file back.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexSet;
use serde::Serialize;

use super::doc::{humanize, DescriptorKind, DocBlock, FieldDescriptor};
use super::filter::FieldFilter;
use super::resolver::TypeResolver;
use super::types::php_type_for;
use crate::error::{AnnotateError, Result};
use crate::php::names;
use crate::registry::{ConfigKey, ConfigValue, ModelRegistry, MANY_MANY_LIST};
use crate::source::{SourceFile, LINE_SEPARATOR};

/// Progress of a class through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loaded,
    FieldsCollected,
    Filtered,
    Formatted,
    Merged,
    /// Finished without touching the file.
    Dry,
    /// Finished by writing the file.
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loaded => "loaded",
            Stage::FieldsCollected => "fields collected",
            Stage::Filtered => "filtered",
            Stage::Formatted => "formatted",
            Stage::Merged => "merged",
            Stage::Dry => "dry",
            Stage::Written => "written",
        };
        f.write_str(name)
    }
}

/// Switches controlling what the annotator does with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateOptions {
    pub dry_run: bool,
    /// Import unresolvable types instead of printing them fully qualified.
    pub add_use_statements: bool,
    pub create_backup_file: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            add_use_statements: false,
            create_backup_file: false,
        }
    }
}

/// What happened to one class.
#[derive(Debug, Clone)]
pub struct ClassOutcome {
    pub fqn: String,
    pub path: PathBuf,
    /// Complete file content after annotation.
    pub content: String,
    pub stage: Stage,
    pub properties_added: Vec<String>,
    pub methods_added: Vec<String>,
    pub imports_added: Vec<String>,
    pub backup: Option<PathBuf>,
}

impl ClassOutcome {
    /// Whether any annotation or import was generated.
    pub fn changed(&self) -> bool {
        !self.properties_added.is_empty() || !self.methods_added.is_empty() || !self.imports_added.is_empty()
    }

    pub fn written(&self) -> bool {
        self.stage == Stage::Written
    }
}

/// Generates annotations for model classes known to a registry.
pub struct Annotator<'r, R: ModelRegistry + ?Sized> {
    registry: &'r R,
    filter: FieldFilter,
    options: AnnotateOptions,
}

impl<'r, R: ModelRegistry + ?Sized> Annotator<'r, R> {
    pub fn new(registry: &'r R, filter: FieldFilter, options: AnnotateOptions) -> Self {
        Self {
            registry,
            filter,
            options,
        }
    }

    pub fn options(&self) -> AnnotateOptions {
        self.options
    }

    /// Annotate a single class.
    pub fn annotate(&self, fqn: &str) -> Result<ClassOutcome> {
        let path = self
            .registry
            .locate_source_file(fqn)
            .ok_or_else(|| AnnotateError::unexpected(fqn, "no source file is known for this class"))?;

        let mut file = SourceFile::load(&path)?;
        let class = file
            .class(fqn)
            .ok_or_else(|| AnnotateError::unexpected(fqn, format!("class not declared in {}", path.display())))?;
        tracing::debug!(class = fqn, stage = %Stage::Loaded, path = %path.display());

        let resolver = TypeResolver::new(
            file.imports(),
            self.registry.classes_in_namespace(names::namespace_of(fqn)),
            self.options.add_use_statements,
        );

        let candidates = self.collect(fqn, &resolver)?;
        tracing::debug!(
            class = fqn,
            stage = %Stage::FieldsCollected,
            properties = candidates.properties.len(),
            methods = candidates.methods.len()
        );

        let existing_doc = class.doc_text().to_string();
        let block = DocBlock {
            properties: undocumented(candidates.properties, &existing_doc),
            methods: undocumented(candidates.methods, &existing_doc),
        };
        tracing::debug!(
            class = fqn,
            stage = %Stage::Filtered,
            properties = block.properties.len(),
            methods = block.methods.len()
        );

        let mut outcome = ClassOutcome {
            fqn: fqn.to_string(),
            path: path.clone(),
            content: String::new(),
            stage: Stage::Dry,
            properties_added: block.properties.iter().map(|p| p.field_name.clone()).collect(),
            methods_added: block.methods.iter().map(|m| m.field_name.clone()).collect(),
            imports_added: Vec::new(),
            backup: None,
        };

        if block.is_empty() {
            outcome.content = file.content().to_string();
            return Ok(outcome);
        }

        let new_imports: IndexSet<String> = block
            .properties
            .iter()
            .chain(block.methods.iter())
            .flat_map(|d| d.imports.iter().cloned())
            .collect();

        let new_doc = block.render(&existing_doc);
        tracing::debug!(class = fqn, stage = %Stage::Formatted);

        // The doc range refers to the text as loaded, so splice it before
        // any line is inserted.
        if let Some(range) = class.doc_range.clone() {
            if !file.replace_range(range, &existing_doc, &new_doc) {
                return Err(AnnotateError::unexpected(fqn, "class doc comment moved while merging"));
            }
        }

        let inserted_lines = if new_imports.is_empty() {
            0
        } else {
            let statements: Vec<String> = new_imports.iter().map(|i| format!("use {};", i)).collect();
            let at_line = import_insert_line(&file);
            file.insert_text_at_line(&statements.join(LINE_SEPARATOR), at_line);
            statements.len()
        };

        if class.doc_range.is_none() {
            file.insert_text_at_line(&new_doc, class.declared_line + inserted_lines);
        }
        tracing::debug!(class = fqn, stage = %Stage::Merged, imports = new_imports.len());

        outcome.imports_added = new_imports.into_iter().collect();
        outcome.content = file.content().to_string();

        if !self.options.dry_run {
            outcome.backup = file.write(self.options.create_backup_file)?;
            outcome.stage = Stage::Written;
        }

        Ok(outcome)
    }

    /// Build descriptors for every configured, non-excluded field.
    fn collect(&self, fqn: &str, resolver: &TypeResolver) -> Result<DocBlock> {
        let is_site_tree_like = self.registry.is_site_tree_like(fqn);
        let mut block = DocBlock::default();

        for key in ConfigKey::PROPERTY_KEYS {
            for (field, value) in self.registry.field_config(fqn, key) {
                if self.filter.is_excluded(&field, is_site_tree_like) {
                    continue;
                }

                if key == ConfigKey::Db {
                    let spec = value.as_str().ok_or_else(|| {
                        AnnotateError::unexpected(fqn, format!("db field {} is not a type spec", field))
                    })?;
                    block.properties.push(FieldDescriptor {
                        kind: DescriptorKind::ScalarProperty,
                        resolved_type: php_type_for(spec),
                        description: format!("{} ...", field),
                        field_name: field,
                        imports: Vec::new(),
                    });
                    continue;
                }

                let target = related_class(fqn, key, &field, &value, "class")?;
                let shortened = resolver.shorten(target);
                block.properties.push(FieldDescriptor {
                    kind: DescriptorKind::RelationProperty,
                    description: format!("{} {} {{@see {}}}", humanize(key.as_str()), field, shortened.resolved),
                    resolved_type: shortened.resolved,
                    imports: shortened.new_import.into_iter().collect(),
                    field_name: field.clone(),
                });

                if key == ConfigKey::HasOne {
                    block.properties.push(FieldDescriptor {
                        kind: DescriptorKind::RelationProperty,
                        field_name: format!("{}ID", field),
                        resolved_type: "int".to_string(),
                        description: format!("{} ID", field),
                        imports: Vec::new(),
                    });
                }
            }
        }

        for key in ConfigKey::METHOD_KEYS {
            for (field, value) in self.registry.field_config(fqn, key) {
                if self.filter.is_excluded(&field, is_site_tree_like) {
                    continue;
                }

                let related = related_class(fqn, key, &field, &value, "through")?;
                let list_type = if value.is_structured() {
                    MANY_MANY_LIST
                } else {
                    key.list_type()
                };

                let related = resolver.shorten(related);
                let list = resolver.shorten(list_type);
                block.methods.push(FieldDescriptor {
                    kind: DescriptorKind::RelationMethod,
                    description: format!("{} {} {{@see {}}}", humanize(key.as_str()), field, related.resolved),
                    resolved_type: list.resolved,
                    imports: related.new_import.into_iter().chain(list.new_import).collect(),
                    field_name: field,
                });
            }
        }

        Ok(block)
    }
}

/// Class a relation points at: the value itself, or `member` of a
/// structured descriptor.
fn related_class<'v>(
    fqn: &str,
    key: ConfigKey,
    field: &str,
    value: &'v ConfigValue,
    member: &str,
) -> Result<&'v str> {
    match value {
        ConfigValue::Str(class) => Ok(class),
        ConfigValue::Map(_) => value.get(member).and_then(ConfigValue::as_str).ok_or_else(|| {
            AnnotateError::unexpected(
                fqn,
                format!("{} relation {} has no '{}' class", key, field, member),
            )
        }),
        ConfigValue::List(_) => Err(AnnotateError::unexpected(
            fqn,
            format!("{} relation {} is not a class name", key, field),
        )),
    }
}

fn undocumented(descriptors: Vec<FieldDescriptor>, existing_doc: &str) -> Vec<FieldDescriptor> {
    descriptors
        .into_iter()
        .filter(|d| !d.is_documented_in(existing_doc))
        .collect()
}

/// Line new `use` statements go to: after the last import, else after the
/// namespace declaration, else after the open tag.
fn import_insert_line(file: &SourceFile) -> usize {
    if let Some(last) = file.last_import_statement() {
        return last.end_line + 1;
    }
    if let Some(namespace) = file.namespace() {
        return namespace.line + 1;
    }
    file.open_tag_line().map(|line| line + 1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldConfig, ModelClass, ProjectRegistry, RegistryOptions};
    use std::fs;
    use tempfile::TempDir;

    const PLAYER: &str = "<?php

namespace App\\Model;

use SilverStripe\\ORM\\DataObject;

class Player extends DataObject
{
}
";

    fn fields(entries: &[(&str, &str)]) -> FieldConfig {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
            .collect()
    }

    fn setup(source: &str, class: ModelClass) -> (TempDir, ProjectRegistry) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Player.php");
        fs::write(&path, source).unwrap();

        let mut class = class;
        class.path = path;
        let registry = ProjectRegistry::from_classes(
            vec![
                class,
                ModelClass::new("App\\Model\\Team", temp.path().join("Team.php")),
            ],
            RegistryOptions::default(),
        );
        (temp, registry)
    }

    fn player() -> ModelClass {
        ModelClass::new("App\\Model\\Player", "")
            .with_parent("SilverStripe\\ORM\\DataObject")
            .with_config(ConfigKey::Db, fields(&[("Name", "Varchar"), ("Active", "Boolean")]))
            .with_config(ConfigKey::HasOne, fields(&[("Team", "App\\Model\\Team")]))
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let (temp, registry) = setup(PLAYER, player());
        let annotator = Annotator::new(&registry, FieldFilter::default(), AnnotateOptions::default());

        let outcome = annotator.annotate("App\\Model\\Player").unwrap();

        assert_eq!(outcome.stage, Stage::Dry);
        assert!(outcome.changed());
        assert_eq!(outcome.properties_added, vec!["Name", "Active", "Team", "TeamID"]);
        assert!(outcome.content.contains(" * @property Team   $Team   Has one Team {@see Team}"));
        assert_eq!(fs::read_to_string(temp.path().join("Player.php")).unwrap(), PLAYER);
    }

    #[test]
    fn test_doc_inserted_above_class() {
        let (_temp, registry) = setup(PLAYER, player());
        let annotator = Annotator::new(&registry, FieldFilter::default(), AnnotateOptions::default());

        let outcome = annotator.annotate("App\\Model\\Player").unwrap();
        let expected = "<?php

namespace App\\Model;

use SilverStripe\\ORM\\DataObject;

/**
 * @property string $Name   Name ...
 * @property bool   $Active Active ...
 * @property Team   $Team   Has one Team {@see Team}
 * @property int    $TeamID Team ID
 */
class Player extends DataObject
{
}
";
        assert_eq!(outcome.content, expected);
    }

    #[test]
    fn test_write_adds_imports_and_backup() {
        let class = ModelClass::new("App\\Model\\Player", "")
            .with_parent("SilverStripe\\ORM\\DataObject")
            .with_config(ConfigKey::HasMany, fields(&[("Scores", "App\\Stats\\Score")]));
        let (temp, registry) = setup(PLAYER, class);
        let options = AnnotateOptions {
            dry_run: false,
            add_use_statements: true,
            create_backup_file: true,
        };
        let annotator = Annotator::new(&registry, FieldFilter::default(), options);

        let outcome = annotator.annotate("App\\Model\\Player").unwrap();

        assert!(outcome.written());
        assert_eq!(
            outcome.imports_added,
            vec!["App\\Stats\\Score", "SilverStripe\\ORM\\HasManyList"]
        );
        assert_eq!(outcome.backup, Some(temp.path().join("Player.php.bck")));

        let written = fs::read_to_string(temp.path().join("Player.php")).unwrap();
        assert!(written.contains(
            "use SilverStripe\\ORM\\DataObject;\nuse App\\Stats\\Score;\nuse SilverStripe\\ORM\\HasManyList;\n"
        ));
        assert!(written.contains(" * @method HasManyList Scores() Has many Scores {@see Score}\n */\nclass Player"));
    }

    #[test]
    fn test_only_the_class_doc_is_merged() {
        let source = "<?php

namespace App\\Model;

use SilverStripe\\ORM\\DataObject;

/**
 * @internal
 */
function helper()
{
}

/**
 * @internal
 */
class Player extends DataObject
{
}
";
        let class = ModelClass::new("App\\Model\\Player", "")
            .with_parent("SilverStripe\\ORM\\DataObject")
            .with_config(ConfigKey::Db, fields(&[("Name", "Varchar")]))
            .with_config(ConfigKey::HasMany, fields(&[("Scores", "App\\Stats\\Score")]));
        let (_temp, registry) = setup(source, class);
        let options = AnnotateOptions {
            add_use_statements: true,
            ..AnnotateOptions::default()
        };
        let annotator = Annotator::new(&registry, FieldFilter::default(), options);

        let outcome = annotator.annotate("App\\Model\\Player").unwrap();

        assert_eq!(outcome.content.matches("@property string $Name").count(), 1);
        assert!(outcome.content.contains("/**\n * @internal\n */\nfunction helper()"));
        assert!(outcome.content.contains(
            "/**\n * @internal\n *\n * @property string $Name Name ...\n *\n * @method HasManyList Scores() Has many Scores {@see Score}\n */\nclass Player"
        ));
        assert!(outcome
            .content
            .contains("use SilverStripe\\ORM\\DataObject;\nuse App\\Stats\\Score;\nuse SilverStripe\\ORM\\HasManyList;\n"));
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let (temp, registry) = setup(PLAYER, player());
        let options = AnnotateOptions {
            dry_run: false,
            ..AnnotateOptions::default()
        };
        let annotator = Annotator::new(&registry, FieldFilter::default(), options);

        annotator.annotate("App\\Model\\Player").unwrap();
        let first = fs::read_to_string(temp.path().join("Player.php")).unwrap();

        let again = annotator.annotate("App\\Model\\Player").unwrap();
        assert!(!again.changed());
        assert_eq!(again.stage, Stage::Dry);
        assert_eq!(fs::read_to_string(temp.path().join("Player.php")).unwrap(), first);
    }

    #[test]
    fn test_excluded_fields_are_skipped() {
        let (_temp, registry) = setup(PLAYER, player());
        let filter = FieldFilter::new(vec![], vec!["Active".to_string()]);
        let annotator = Annotator::new(&registry, filter, AnnotateOptions::default());

        let outcome = annotator.annotate("App\\Model\\Player").unwrap();
        assert!(!outcome.properties_added.contains(&"Active".to_string()));
        assert!(!outcome.content.contains("$Active"));
    }

    #[test]
    fn test_structured_to_many_without_through_fails() {
        let mut descriptor = indexmap::IndexMap::new();
        descriptor.insert("from".to_string(), ConfigValue::from("Player"));
        let mut many_many = FieldConfig::new();
        many_many.insert("Clubs".to_string(), ConfigValue::Map(descriptor));

        let class = ModelClass::new("App\\Model\\Player", "")
            .with_parent("SilverStripe\\ORM\\DataObject")
            .with_config(ConfigKey::ManyMany, many_many);
        let (_temp, registry) = setup(PLAYER, class);
        let annotator = Annotator::new(&registry, FieldFilter::default(), AnnotateOptions::default());

        assert!(matches!(
            annotator.annotate("App\\Model\\Player"),
            Err(AnnotateError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_unknown_class_fails() {
        let (_temp, registry) = setup(PLAYER, player());
        let annotator = Annotator::new(&registry, FieldFilter::default(), AnnotateOptions::default());

        assert!(matches!(
            annotator.annotate("App\\Model\\Nobody"),
            Err(AnnotateError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_import_insert_line_fallbacks() {
        let file = SourceFile::from_source("A.php", "<?php\nnamespace App;\n\nclass A {}\n".to_string()).unwrap();
        assert_eq!(import_insert_line(&file), 3);

        let file = SourceFile::from_source("A.php", "<?php\n\nclass A {}\n".to_string()).unwrap();
        assert_eq!(import_insert_line(&file), 2);

        let file = SourceFile::from_source(
            "A.php",
            "<?php\nnamespace App;\nuse Foo\\{\n    Bar,\n    Baz\n};\nclass A {}\n".to_string(),
        )
        .unwrap();
        assert_eq!(import_insert_line(&file), 7);
    }
}
