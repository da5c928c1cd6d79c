//! Documentation block generation.
//!
//! Field descriptors are rendered as aligned `@property` / `@method` tag
//! lines and either wrapped in a fresh `/** ... */` block or appended to the
//! end of an existing class doc comment.

use regex::Regex;

use crate::source::LINE_SEPARATOR;

/// What a descriptor documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Column-like field from the `db` configuration.
    ScalarProperty,
    /// To-one relation, or the integer id companion of a `has_one`.
    RelationProperty,
    /// To-many relation, documented as a list-returning method.
    RelationMethod,
}

/// A single proposed annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub kind: DescriptorKind,
    /// Field name exactly as configured.
    pub field_name: String,
    /// Type as printed: short name, root-qualified name or PHP scalar.
    pub resolved_type: String,
    pub description: String,
    /// Fully-qualified names this annotation needs new `use` statements for.
    pub imports: Vec<String>,
}

impl FieldDescriptor {
    pub fn is_method(&self) -> bool {
        self.kind == DescriptorKind::RelationMethod
    }

    /// Whether `doc` already contains an annotation declaring the same
    /// (type, name) pair.
    pub fn is_documented_in(&self, doc: &str) -> bool {
        if doc.is_empty() {
            return false;
        }

        let pattern = if self.is_method() {
            format!(
                r"(?m)@method\s*{}\s*{}\(",
                regex::escape(&self.resolved_type),
                regex::escape(&self.field_name)
            )
        } else {
            format!(
                r"(?m)@property\s*{}\s*\${}\b",
                regex::escape(&self.resolved_type),
                regex::escape(&self.field_name)
            )
        };

        // Escaped input always compiles; treat a failure as "not documented".
        Regex::new(&pattern)
            .map(|re| re.is_match(doc))
            .unwrap_or(false)
    }
}

/// Turn a configuration key into a description prefix (`has_one` -> `Has one`).
pub fn humanize(config_key: &str) -> String {
    let spaced = config_key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Annotations to add to one class.
#[derive(Debug, Clone, Default)]
pub struct DocBlock {
    pub properties: Vec<FieldDescriptor>,
    pub methods: Vec<FieldDescriptor>,
}

impl DocBlock {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.methods.is_empty()
    }

    /// Aligned tag lines, properties first, separated from methods by a bare `*`.
    pub fn tag_lines(&self) -> Vec<String> {
        let type_width = max_width(self.properties.iter().map(|p| p.resolved_type.as_str()));
        let name_width = max_width(self.properties.iter().map(|p| p.field_name.as_str()));
        let method_type_width = max_width(self.methods.iter().map(|m| m.resolved_type.as_str()));
        let method_name_width = max_width(self.methods.iter().map(|m| m.field_name.as_str())) + 2;

        let mut lines = Vec::with_capacity(self.properties.len() + self.methods.len() + 1);

        for p in &self.properties {
            lines.push(format!(
                " * @property {:<tw$} ${:<nw$} {}",
                p.resolved_type,
                p.field_name,
                p.description,
                tw = type_width,
                nw = name_width
            ));
        }

        if !self.properties.is_empty() && !self.methods.is_empty() {
            lines.push(" *".to_string());
        }

        for m in &self.methods {
            lines.push(format!(
                " * @method {:<tw$} {:<nw$} {}",
                m.resolved_type,
                format!("{}()", m.field_name),
                m.description,
                tw = method_type_width,
                nw = method_name_width
            ));
        }

        lines
    }

    /// Render the class doc comment.
    ///
    /// Without an existing comment a fresh block is produced. Otherwise the
    /// closing `*/` of `existing` becomes a `*` separator line and the new
    /// tag lines follow it, keeping every existing line untouched.
    pub fn render(&self, existing: &str) -> String {
        let mut lines = self.tag_lines();
        lines.push(" */".to_string());
        let addition = lines.join(LINE_SEPARATOR);

        let existing = existing.trim_end();
        match existing.strip_suffix("*/") {
            Some(head) if !existing.is_empty() => {
                format!("{}*{}{}", head, LINE_SEPARATOR, addition)
            }
            _ => format!("/**{}{}", LINE_SEPARATOR, addition),
        }
    }
}

fn max_width<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(|v| v.chars().count()).max().unwrap_or(0)
}
