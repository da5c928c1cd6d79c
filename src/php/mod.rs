//! PHP parsing on top of tree-sitter.
//!
//! This module provides:
//! - `ParsedFile`: a tree-sitter tree together with the source it was built from
//! - `tree`: typed searches for namespace, class and import nodes
//! - `names`: helpers for PHP qualified names

use std::path::Path;

use tree_sitter::{Language, Parser};

use crate::error::{AnnotateError, Result};

pub mod names;
pub mod tree;

pub use tree::{ClassDecl, ImportStatement, NamespaceDecl, PhpNode, UseDeclaration};

lazy_static::lazy_static! {
    static ref PHP_LANGUAGE: Language = tree_sitter_php::LANGUAGE_PHP.into();
}

/// Holds a parsed tree-sitter tree and the source it was parsed from.
///
/// The tree always describes `source` as it was at parse time. Callers that
/// mutate text must re-parse to get consistent line numbers.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Root node of the tree.
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Whether the parser had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Parse PHP source code.
///
/// Returns an error only if tree-sitter gives up entirely. Files with syntax
/// errors still produce a tree containing ERROR nodes; see
/// [`ParsedFile::has_errors`].
pub fn parse(path: &Path, source: String) -> Result<ParsedFile> {
    let mut parser = Parser::new();
    parser
        .set_language(&PHP_LANGUAGE)
        .map_err(|_| AnnotateError::Parse {
            path: path.to_path_buf(),
        })?;

    let tree = parser.parse(&source, None).ok_or_else(|| AnnotateError::Parse {
        path: path.to_path_buf(),
    })?;

    Ok(ParsedFile { tree, source })
}

/// Parse a source string that has no file behind it (tests, stdin).
pub fn parse_str(source: &str) -> Result<ParsedFile> {
    parse(Path::new("<memory>"), source.to_string())
}
