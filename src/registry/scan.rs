//! Static scan of PHP sources for model classes and their configuration.
//!
//! Only what can be read off the syntax tree is used: class declarations,
//! `extends` clauses resolved against the file's imports, and static
//! configuration arrays whose values are literals. Entries with any other
//! value (function calls, constants, variables) are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tree_sitter::Node;
use walkdir::WalkDir;

use super::index::{ModelClass, RegistryOptions};
use super::value::{ConfigKey, ConfigValue, FieldConfig};
use crate::error::Result;
use crate::php::tree::{self, ImportKind, ImportStatement};
use crate::php::{self, names, ParsedFile};

/// Collect all PHP files under `root` and extract their classes.
pub(super) fn scan_project(root: &Path, options: &RegistryOptions) -> Result<Vec<ModelClass>> {
    let mut classes = Vec::new();

    for path in collect_files(root, options) {
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        let parsed = php::parse(&path, source)?;
        if parsed.has_errors() {
            tracing::warn!(path = %path.display(), "skipping file with syntax errors");
            continue;
        }

        let found = classes_in_file(&path, &parsed);
        tracing::trace!(path = %path.display(), classes = found.len(), "scanned file");
        classes.extend(found);
    }

    tracing::debug!(root = %root.display(), classes = classes.len(), "project scan complete");
    Ok(classes)
}

fn collect_files(root: &Path, options: &RegistryOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if e.file_type().is_dir() {
                // Skip hidden directories and dependency trees
                if name.starts_with('.') || name == "node_modules" {
                    return false;
                }
                if name == "vendor" && !options.include_vendor {
                    return false;
                }
            }
            let relative = e.path().strip_prefix(root).unwrap_or(e.path());
            !options.excluded_paths.is_match(relative)
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).display().to_string();
                tracing::warn!(path = %path, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|e| e.to_str()) == Some("php") {
            files.push(path.to_path_buf());
        }
    }

    files
}

/// Names a configuration value may refer to while being evaluated.
struct Scope<'a> {
    namespace: &'a str,
    imports: &'a [ImportStatement],
    class_fqn: &'a str,
    parent_fqn: Option<&'a str>,
}

fn classes_in_file(path: &Path, parsed: &ParsedFile) -> Vec<ModelClass> {
    let imports: Vec<ImportStatement> = tree::find_all_imports(parsed)
        .into_iter()
        .filter(|i| i.kind == ImportKind::Class)
        .collect();

    tree::classes_with_namespace(parsed)
        .into_iter()
        .filter_map(|(namespace, node)| {
            let decl = tree::class_decl(parsed, node);
            if decl.short_name.is_empty() {
                return None;
            }

            let fqn = names::join(&namespace, &decl.short_name);
            let parent = decl
                .extends
                .as_deref()
                .map(|p| names::resolve_class(p, &namespace, &imports));

            let scope = Scope {
                namespace: &namespace,
                imports: &imports,
                class_fqn: &fqn,
                parent_fqn: parent.as_deref(),
            };
            let config = static_config(parsed, &scope, node);

            Some(ModelClass {
                fqn,
                parent,
                is_abstract: decl.is_abstract,
                path: path.to_path_buf(),
                config,
            })
        })
        .collect()
}

/// Static configuration arrays declared in a class body.
fn static_config(parsed: &ParsedFile, scope: &Scope, class: Node) -> IndexMap<ConfigKey, FieldConfig> {
    let mut config = IndexMap::new();

    let Some(body) = class.child_by_field_name("body") else {
        return config;
    };

    for member in body.named_children(&mut body.walk()) {
        if member.kind() != "property_declaration" || !tree::has_modifier(member, "static") {
            continue;
        }

        for element in member
            .named_children(&mut member.walk())
            .filter(|c| c.kind() == "property_element")
        {
            let Some(key) = property_name(parsed, element).and_then(ConfigKey::parse) else {
                continue;
            };
            let Some(value) = property_default(element) else {
                continue;
            };

            match evaluate(parsed, scope, value) {
                Some(ConfigValue::Map(fields)) => {
                    config.insert(key, fields);
                }
                Some(ConfigValue::List(items)) if items.is_empty() => {
                    config.insert(key, FieldConfig::new());
                }
                _ => tracing::debug!(
                    class = scope.class_fqn,
                    key = %key,
                    "configuration is not a static keyed array"
                ),
            }
        }
    }

    config
}

fn property_name<'a>(parsed: &'a ParsedFile, element: Node) -> Option<&'a str> {
    let name = element.child_by_field_name("name").or_else(|| {
        element
            .named_children(&mut element.walk())
            .find(|c| c.kind() == "variable_name")
    })?;
    Some(parsed.node_text(name).trim_start_matches('$'))
}

fn property_default(element: Node) -> Option<Node> {
    if let Some(value) = element.child_by_field_name("default_value") {
        return Some(value);
    }
    element
        .named_children(&mut element.walk())
        .find(|c| c.kind() == "property_initializer")
        .and_then(|init| init.named_child(0))
}

/// Evaluate a constant expression.
fn evaluate(parsed: &ParsedFile, scope: &Scope, node: Node) -> Option<ConfigValue> {
    match node.kind() {
        "string" | "encapsed_string" => string_literal(parsed, node).map(ConfigValue::Str),
        "integer" => Some(ConfigValue::Str(parsed.node_text(node).to_string())),
        "class_constant_access_expression" => class_name_constant(parsed, scope, node).map(ConfigValue::Str),
        "parenthesized_expression" => node.named_child(0).and_then(|n| evaluate(parsed, scope, n)),
        "binary_expression" => {
            let operator = node.child_by_field_name("operator").map(|o| parsed.node_text(o))?;
            if operator != "." {
                return None;
            }
            let left = evaluate(parsed, scope, node.child_by_field_name("left")?)?;
            let right = evaluate(parsed, scope, node.child_by_field_name("right")?)?;
            Some(ConfigValue::Str(format!("{}{}", left.as_str()?, right.as_str()?)))
        }
        "array_creation_expression" => array_literal(parsed, scope, node),
        _ => None,
    }
}

fn array_literal(parsed: &ParsedFile, scope: &Scope, node: Node) -> Option<ConfigValue> {
    let mut keyed: IndexMap<String, ConfigValue> = IndexMap::new();
    let mut has_keys = false;
    let mut next_index = 0usize;

    for element in node
        .named_children(&mut node.walk())
        .filter(|c| c.kind() == "array_element_initializer")
    {
        let parts: Vec<Node> = element
            .named_children(&mut element.walk())
            .filter(|c| !matches!(c.kind(), "comment" | "by_ref"))
            .collect();

        let (key, value) = match parts.as_slice() {
            [value] => {
                let key = next_index.to_string();
                next_index += 1;
                (key, *value)
            }
            [key, value] => {
                let Some(key) = evaluate(parsed, scope, *key).and_then(|k| k.as_str().map(str::to_string))
                else {
                    tracing::debug!(class = scope.class_fqn, "skipping entry with non-literal key");
                    continue;
                };
                has_keys = true;
                (key, *value)
            }
            _ => continue,
        };

        match evaluate(parsed, scope, value) {
            Some(value) => {
                keyed.insert(key, value);
            }
            None => tracing::debug!(
                class = scope.class_fqn,
                entry = %key,
                value = parsed.node_text(value),
                "skipping entry with unsupported value"
            ),
        }
    }

    if has_keys {
        Some(ConfigValue::Map(keyed))
    } else {
        Some(ConfigValue::List(keyed.into_values().collect()))
    }
}

/// `Foo::class`, `self::class`, `static::class` and `parent::class`.
fn class_name_constant(parsed: &ParsedFile, scope: &Scope, node: Node) -> Option<String> {
    let scope_node = node.named_child(0)?;
    let constant = node.named_child(node.named_child_count().checked_sub(1)?)?;
    if scope_node == constant || !parsed.node_text(constant).eq_ignore_ascii_case("class") {
        return None;
    }

    let name = parsed.node_text(scope_node);
    match name.to_ascii_lowercase().as_str() {
        "self" | "static" => Some(scope.class_fqn.to_string()),
        "parent" => scope.parent_fqn.map(str::to_string),
        _ => Some(names::resolve_class(name, scope.namespace, scope.imports)),
    }
}

/// Unquote a string literal. Interpolated strings are not constant.
fn string_literal(parsed: &ParsedFile, node: Node) -> Option<String> {
    let constant = node
        .named_children(&mut node.walk())
        .all(|c| matches!(c.kind(), "string_content" | "string_value" | "escape_sequence"));
    if !constant {
        return None;
    }

    let text = parsed.node_text(node);
    let text = text.strip_prefix(&['b', 'B'][..]).unwrap_or(text);
    let quote = text.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == '\\' || next == quote || (quote == '"' && next == '$') => {
                    out.push(next);
                    chars.next();
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }

    Some(out)
}
