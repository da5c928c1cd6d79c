//! Typed searches over a PHP syntax tree.
//!
//! tree-sitter nodes are classified into a small closed set of variants
//! ([`PhpNode`]) and walked with a generic pre-order [`fold`]. The public
//! searches are built on top of it:
//!
//! - [`find_namespace`]: the first namespace declaration
//! - [`find_class`]: the first class declaration with a given short name
//! - [`find_all_imports`]: every imported symbol, in source order
//! - [`find_last_import_statement`]: the last `use` statement
//!
//! All searches return "not found" as their only negative outcome.

use std::ops::{ControlFlow, Range};

use tree_sitter::Node;

use super::names::{self, ImportedName};
use super::ParsedFile;

/// Node variants the annotation engine cares about.
#[derive(Debug, Clone, Copy)]
pub enum PhpNode<'t> {
    /// `namespace Foo\Bar;` or `namespace Foo\Bar { ... }`
    Namespace(Node<'t>),
    /// `class Foo extends Bar { ... }`
    Class(Node<'t>),
    /// A whole `use ...;` statement at namespace level.
    UseDeclaration(Node<'t>),
    /// A single imported symbol inside a `use` statement.
    UseClause(Node<'t>),
    Other(Node<'t>),
}

impl<'t> PhpNode<'t> {
    /// Classify a tree-sitter node.
    pub fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "namespace_definition" => PhpNode::Namespace(node),
            "class_declaration" => PhpNode::Class(node),
            "namespace_use_declaration" => PhpNode::UseDeclaration(node),
            "namespace_use_clause" | "namespace_use_group_clause" => PhpNode::UseClause(node),
            _ => PhpNode::Other(node),
        }
    }

    /// The underlying tree-sitter node.
    pub fn node(&self) -> Node<'t> {
        match *self {
            PhpNode::Namespace(n)
            | PhpNode::Class(n)
            | PhpNode::UseDeclaration(n)
            | PhpNode::UseClause(n)
            | PhpNode::Other(n) => n,
        }
    }
}

/// Depth-first, pre-order fold over the tree rooted at `root`.
///
/// `f` receives the accumulator and each classified node in source order.
/// Returning `ControlFlow::Break` stops the walk immediately.
pub fn fold<'t, A, F>(root: Node<'t>, init: A, mut f: F) -> A
where
    F: FnMut(A, PhpNode<'t>) -> ControlFlow<A, A>,
{
    let mut acc = init;
    let mut cursor = root.walk();

    loop {
        acc = match f(acc, PhpNode::classify(cursor.node())) {
            ControlFlow::Continue(acc) => acc,
            ControlFlow::Break(acc) => return acc,
        };

        if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.node() == root {
                return acc;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return acc;
            }
        }
    }
}

/// First node in pre-order matching `pred`.
pub fn find_first<'t>(root: Node<'t>, pred: impl Fn(&PhpNode<'t>) -> bool) -> Option<PhpNode<'t>> {
    fold(root, None, |acc, node| {
        if pred(&node) {
            ControlFlow::Break(Some(node))
        } else {
            ControlFlow::Continue(acc)
        }
    })
}

/// All nodes in pre-order matching `pred`.
pub fn find_all<'t>(root: Node<'t>, pred: impl Fn(&PhpNode<'t>) -> bool) -> Vec<PhpNode<'t>> {
    fold(root, Vec::new(), |mut acc, node| {
        if pred(&node) {
            acc.push(node);
        }
        ControlFlow::Continue(acc)
    })
}

/// A namespace declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Namespace name without leading separator; empty for `namespace { }`.
    pub name: String,
    /// Line of the `namespace` keyword (1-indexed).
    pub line: usize,
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Declared short name.
    pub short_name: String,
    /// Doc comment directly preceding the class, verbatim.
    pub doc_comment: Option<String>,
    /// Byte range of `doc_comment` in the parsed source.
    pub doc_range: Option<Range<usize>>,
    /// First line of the declaration including attributes and modifiers (1-indexed).
    pub declared_line: usize,
    /// Parent class exactly as written after `extends`.
    pub extends: Option<String>,
    pub is_abstract: bool,
}

impl ClassDecl {
    /// Existing doc comment text, or an empty string.
    pub fn doc_text(&self) -> &str {
        self.doc_comment.as_deref().unwrap_or("")
    }
}

/// What a `use` statement imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Class,
    Function,
    Const,
}

/// A single imported symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Fully-qualified imported name without leading separator.
    pub imported_name: String,
    /// Explicit alias (`use Foo\Bar as Baz`).
    pub alias: Option<String>,
    pub kind: ImportKind,
    /// Line of the enclosing `use` statement (1-indexed), not of the symbol.
    pub source_line: usize,
}

impl ImportedName for ImportStatement {
    fn imported_name(&self) -> &str {
        &self.imported_name
    }

    fn local_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| names::short_name(&self.imported_name))
    }
}

/// A statement-level `use` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseDeclaration {
    /// First line (1-indexed).
    pub line: usize,
    /// Last line (1-indexed); differs from `line` for multi-line group imports.
    pub end_line: usize,
}

/// Find the first namespace declaration.
pub fn find_namespace(parsed: &ParsedFile) -> Option<NamespaceDecl> {
    let node = find_first(parsed.root(), |n| matches!(n, PhpNode::Namespace(_)))?.node();
    Some(namespace_decl(parsed, node))
}

/// Find the first class declaration whose short name equals `short_name`.
///
/// When a file declares the same class name more than once (for example in
/// conditional branches) the first one in source order wins.
pub fn find_class(parsed: &ParsedFile, short_name: &str) -> Option<ClassDecl> {
    let node = find_first(parsed.root(), |n| match n {
        PhpNode::Class(node) => class_name(parsed, *node) == Some(short_name),
        _ => false,
    })?
    .node();
    Some(class_decl(parsed, node))
}

/// Find every imported symbol in source order.
///
/// Trait `use` inside class bodies and closure `use` clauses are different
/// node kinds and never show up here.
pub fn find_all_imports(parsed: &ParsedFile) -> Vec<ImportStatement> {
    find_all(parsed.root(), |n| matches!(n, PhpNode::UseDeclaration(_)))
        .into_iter()
        .flat_map(|n| use_declaration_imports(parsed, n.node()))
        .collect()
}

/// Find the last statement-level `use` declaration.
pub fn find_last_import_statement(parsed: &ParsedFile) -> Option<UseDeclaration> {
    find_all(parsed.root(), |n| matches!(n, PhpNode::UseDeclaration(_)))
        .last()
        .map(|n| {
            let node = n.node();
            UseDeclaration {
                line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            }
        })
}

/// Line of the `<?php` open tag (1-indexed).
pub fn find_open_tag_line(parsed: &ParsedFile) -> Option<usize> {
    find_first(parsed.root(), |n| n.node().kind() == "php_tag")
        .map(|n| n.node().start_position().row + 1)
}

/// Every class declaration together with the namespace it lives in.
///
/// Works for both `namespace Foo;` and braced `namespace Foo { }` files: the
/// walk is in source order, so the most recent namespace node is the one
/// that applies.
pub fn classes_with_namespace<'t>(parsed: &'t ParsedFile) -> Vec<(String, Node<'t>)> {
    let (_, classes) = fold(
        parsed.root(),
        (String::new(), Vec::new()),
        |(mut namespace, mut classes), node| {
            match node {
                PhpNode::Namespace(n) => namespace = namespace_decl(parsed, n).name,
                PhpNode::Class(n) => classes.push((namespace.clone(), n)),
                _ => {}
            }
            ControlFlow::Continue((namespace, classes))
        },
    );
    classes
}

/// Build a [`ClassDecl`] from a `class_declaration` node.
pub fn class_decl(parsed: &ParsedFile, node: Node) -> ClassDecl {
    let doc_node = node
        .prev_sibling()
        .filter(|prev| prev.kind() == "comment")
        .filter(|prev| parsed.node_text(*prev).starts_with("/**"));

    let extends = node
        .children(&mut node.walk())
        .find(|c| c.kind() == "base_clause")
        .and_then(|clause| first_name_child(clause))
        .map(|n| parsed.node_text(n).to_string());

    ClassDecl {
        short_name: class_name(parsed, node).unwrap_or_default().to_string(),
        doc_comment: doc_node.map(|n| parsed.node_text(n).to_string()),
        doc_range: doc_node.map(|n| n.start_byte()..n.end_byte()),
        declared_line: node.start_position().row + 1,
        extends,
        is_abstract: has_modifier(node, "abstract"),
    }
}

fn class_name<'a>(parsed: &'a ParsedFile, node: Node) -> Option<&'a str> {
    node.child_by_field_name("name").map(|n| parsed.node_text(n))
}

fn namespace_decl(parsed: &ParsedFile, node: Node) -> NamespaceDecl {
    let name = node
        .child_by_field_name("name")
        .or_else(|| {
            node.children(&mut node.walk())
                .find(|c| c.kind() == "namespace_name")
        })
        .map(|n| names::strip_root(parsed.node_text(n)).to_string())
        .unwrap_or_default();

    NamespaceDecl {
        name,
        line: node.start_position().row + 1,
    }
}

pub(crate) fn has_modifier(node: Node, modifier: &str) -> bool {
    let wanted = format!("{}_modifier", modifier);
    node.children(&mut node.walk()).any(|c| {
        let kind = c.kind();
        if kind == modifier || kind == wanted {
            return true;
        }
        (kind.ends_with("_modifier") || kind == "modifiers")
            && c.children(&mut c.walk()).any(|m| m.kind() == modifier)
    })
}

fn first_name_child(node: Node) -> Option<Node> {
    node.named_children(&mut node.walk())
        .find(|c| is_name_kind(c.kind()))
}

fn is_name_kind(kind: &str) -> bool {
    matches!(kind, "name" | "qualified_name" | "namespace_name")
}

fn import_kind_of(node: Node) -> Option<ImportKind> {
    node.children(&mut node.walk())
        .find_map(|c| match c.kind() {
            "function" => Some(ImportKind::Function),
            "const" => Some(ImportKind::Const),
            _ => None,
        })
}

fn use_declaration_imports(parsed: &ParsedFile, decl: Node) -> Vec<ImportStatement> {
    let source_line = decl.start_position().row + 1;
    let kind = import_kind_of(decl).unwrap_or(ImportKind::Class);

    // Group form: `use Foo\{Bar, Baz as Qux};`
    let prefix = decl
        .children(&mut decl.walk())
        .find(|c| c.kind() == "namespace_name")
        .map(|n| names::strip_root(parsed.node_text(n)).to_string());

    let mut clauses = Vec::new();
    for child in decl.named_children(&mut decl.walk()) {
        match PhpNode::classify(child) {
            PhpNode::UseClause(clause) => clauses.push(clause),
            PhpNode::Other(group) if group.kind() == "namespace_use_group" => {
                clauses.extend(
                    group
                        .named_children(&mut group.walk())
                        .filter(|c| matches!(PhpNode::classify(*c), PhpNode::UseClause(_))),
                );
            }
            _ => {}
        }
    }

    clauses
        .into_iter()
        .filter_map(|clause| {
            let (name, alias) = clause_parts(parsed, clause)?;
            let imported_name = match &prefix {
                Some(prefix) => names::join(prefix, names::strip_root(&name)),
                None => names::strip_root(&name).to_string(),
            };
            Some(ImportStatement {
                imported_name,
                alias,
                kind: import_kind_of(clause).unwrap_or(kind),
                source_line,
            })
        })
        .collect()
}

/// Split a use clause into (name, alias).
fn clause_parts(parsed: &ParsedFile, clause: Node) -> Option<(String, Option<String>)> {
    let mut name = None;
    let mut alias = clause
        .child_by_field_name("alias")
        .map(|n| parsed.node_text(n).to_string());
    let mut after_as = false;

    for child in clause.children(&mut clause.walk()) {
        match child.kind() {
            "as" => after_as = true,
            "namespace_aliasing_clause" => {
                alias = first_name_child(child).map(|n| parsed.node_text(n).to_string());
            }
            kind if is_name_kind(kind) => {
                if after_as {
                    if alias.is_none() {
                        alias = Some(parsed.node_text(child).to_string());
                    }
                } else if name.is_none() {
                    name = Some(parsed.node_text(child).to_string());
                }
            }
            _ => {}
        }
    }

    name.map(|n| (n, alias))
}
