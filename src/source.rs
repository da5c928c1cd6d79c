//! A PHP source file loaded for annotation.
//!
//! `SourceFile` owns the raw text, the tree parsed from it at load time and
//! the line-level mutations the annotator needs. The tree is never
//! re-parsed after a mutation: line numbers reported by the searches always
//! refer to the text as it was loaded.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{AnnotateError, Result};
use crate::php::tree::{self, ClassDecl, ImportStatement, NamespaceDecl, UseDeclaration};
use crate::php::{self, names, ParsedFile};

/// Line separator used when splitting and joining content.
pub const LINE_SEPARATOR: &str = "\n";

/// A loaded PHP file.
pub struct SourceFile {
    path: PathBuf,
    content: String,
    parsed: ParsedFile,
}

impl SourceFile {
    /// Load and parse an existing regular file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(AnnotateError::InvalidPath {
                path: path.to_path_buf(),
                reason: "empty path".to_string(),
            });
        }

        let metadata = fs::metadata(path).map_err(|e| AnnotateError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(AnnotateError::InvalidPath {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| AnnotateError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_source(path, content)
    }

    /// Build a source file from text that is already in memory.
    pub fn from_source<P: AsRef<Path>>(path: P, content: String) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let parsed = php::parse(&path, content.clone())?;
        if parsed.has_errors() {
            return Err(AnnotateError::Parse { path });
        }

        Ok(Self {
            path,
            content,
            parsed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current (possibly mutated) content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Tree of the content as loaded.
    pub fn parsed(&self) -> &ParsedFile {
        &self.parsed
    }

    /// Whether the content differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.content != self.parsed.source
    }

    pub fn namespace(&self) -> Option<NamespaceDecl> {
        tree::find_namespace(&self.parsed)
    }

    /// Find the declaration of a class by its fully-qualified name.
    pub fn class(&self, fqn: &str) -> Option<ClassDecl> {
        tree::find_class(&self.parsed, names::short_name(fqn))
    }

    pub fn imports(&self) -> Vec<ImportStatement> {
        tree::find_all_imports(&self.parsed)
    }

    pub fn last_import_statement(&self) -> Option<UseDeclaration> {
        tree::find_last_import_statement(&self.parsed)
    }

    pub fn open_tag_line(&self) -> Option<usize> {
        tree::find_open_tag_line(&self.parsed)
    }

    /// Insert `text` so that it starts at line `at_line` (1-indexed).
    ///
    /// The line currently at `at_line` and everything after it moves down.
    /// Values below 1 are treated as 1; values past the end append.
    pub fn insert_text_at_line(&mut self, text: &str, at_line: usize) -> &mut Self {
        let content = {
            let mut lines: Vec<&str> = self.content.split(LINE_SEPARATOR).collect();
            let index = at_line.max(1).saturating_sub(1).min(lines.len());
            lines.insert(index, text);
            lines.join(LINE_SEPARATOR)
        };
        self.content = content;
        self
    }

    /// Replace the first occurrence of `search` with `replace`.
    pub fn replace_substring(&mut self, search: &str, replace: &str) -> &mut Self {
        if !search.is_empty() {
            self.content = self.content.replacen(search, replace, 1);
        }
        self
    }

    /// Replace the text at `range` with `replace`, provided the range still
    /// holds exactly `expected`.
    ///
    /// Ranges come from the tree, so this must run before any edit that
    /// shifts bytes ahead of `range`. Returns whether the text was replaced.
    pub fn replace_range(&mut self, range: Range<usize>, expected: &str, replace: &str) -> bool {
        if self.content.get(range.clone()) != Some(expected) {
            return false;
        }
        self.content.replace_range(range, replace);
        true
    }

    /// Write the content back to the file.
    ///
    /// With `create_backup` the current file is first copied to the first
    /// free name of `<path>.bck`, `<path>.1.bck`, `<path>.2.bck`, ... which
    /// is returned.
    pub fn write(&self, create_backup: bool) -> Result<Option<PathBuf>> {
        let backup = if create_backup {
            let backup = backup_path(&self.path);
            fs::copy(&self.path, &backup).map_err(|e| AnnotateError::io(&backup, e))?;
            tracing::info!(backup = %backup.display(), "created backup file");
            Some(backup)
        } else {
            None
        };

        fs::write(&self.path, &self.content).map_err(|e| AnnotateError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), "wrote annotations");

        Ok(backup)
    }
}

/// First unused backup name for `path`.
///
/// Not safe against concurrent runs on the same file.
pub fn backup_path(path: &Path) -> PathBuf {
    let base = path.as_os_str().to_string_lossy().to_string();
    let mut candidate = PathBuf::from(format!("{}.bck", base));
    let mut counter = 1;

    while candidate.exists() {
        candidate = PathBuf::from(format!("{}.{}.bck", base, counter));
        counter += 1;
    }

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = "<?php\n\nnamespace App;\n\nclass Foo\n{\n}\n";

    fn write_fixture(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("Foo.php");
        fs::write(&path, SOURCE).unwrap();
        path
    }

    #[test]
    fn test_load_rejects_missing_and_directories() {
        let temp = TempDir::new().unwrap();

        let missing = SourceFile::load(temp.path().join("Missing.php"));
        assert!(matches!(missing, Err(AnnotateError::InvalidPath { .. })));

        let dir = SourceFile::load(temp.path());
        assert!(matches!(dir, Err(AnnotateError::InvalidPath { .. })));

        let empty = SourceFile::load("");
        assert!(matches!(empty, Err(AnnotateError::InvalidPath { .. })));
    }

    #[test]
    fn test_load_rejects_unparseable_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Broken.php");
        fs::write(&path, "<?php\nclass { function }\n").unwrap();

        assert!(matches!(
            SourceFile::load(&path),
            Err(AnnotateError::Parse { .. })
        ));
    }

    #[test]
    fn test_insert_text_at_line() {
        let mut file = SourceFile::from_source("Foo.php", SOURCE.to_string()).unwrap();
        file.insert_text_at_line("/**\n * doc\n */", 5);
        assert_eq!(
            file.content(),
            "<?php\n\nnamespace App;\n\n/**\n * doc\n */\nclass Foo\n{\n}\n"
        );
        assert!(file.is_modified());
    }

    #[test]
    fn test_insert_text_clamps_line_numbers() {
        let mut file = SourceFile::from_source("Foo.php", "<?php\nclass A {}".to_string()).unwrap();
        file.insert_text_at_line("// first", 0);
        assert_eq!(file.content(), "// first\n<?php\nclass A {}");

        file.insert_text_at_line("// last", 100);
        assert_eq!(file.content(), "// first\n<?php\nclass A {}\n// last");
    }

    #[test]
    fn test_replace_substring() {
        let mut file = SourceFile::from_source("Foo.php", SOURCE.to_string()).unwrap();
        file.replace_substring("class Foo", "final class Foo");
        assert!(file.content().contains("final class Foo"));

        file.replace_substring("", "x");
        assert!(file.content().starts_with("<?php"));
    }

    #[test]
    fn test_replace_substring_touches_first_match_only() {
        let mut file = SourceFile::from_source("Foo.php", "<?php\n// a\n// a\n".to_string()).unwrap();
        file.replace_substring("// a", "// b");
        assert_eq!(file.content(), "<?php\n// b\n// a\n");
    }

    #[test]
    fn test_replace_range_checks_expected_text() {
        let mut file = SourceFile::from_source("Foo.php", SOURCE.to_string()).unwrap();
        let start = SOURCE.find("class Foo").unwrap();
        let range = start..start + "class Foo".len();

        assert!(!file.replace_range(range.clone(), "class Bar", "class Baz"));
        assert_eq!(file.content(), SOURCE);

        assert!(file.replace_range(range.clone(), "class Foo", "final class Foo"));
        assert!(file.content().contains("\nfinal class Foo\n"));

        // stale range no longer holds the expected text
        assert!(!file.replace_range(range, "class Foo", "class Foo"));
        assert!(!file.replace_range(0..10_000, "", "x"));
    }

    #[test]
    fn test_write_without_backup() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(&temp);

        let mut file = SourceFile::load(&path).unwrap();
        file.insert_text_at_line("use Bar;", 4);
        let backup = file.write(false).unwrap();

        assert!(backup.is_none());
        assert!(fs::read_to_string(&path).unwrap().contains("use Bar;"));
        assert!(!temp.path().join("Foo.php.bck").exists());
    }

    #[test]
    fn test_write_creates_numbered_backups() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(&temp);

        let file = SourceFile::load(&path).unwrap();
        let first = file.write(true).unwrap().unwrap();
        let second = file.write(true).unwrap().unwrap();
        let third = file.write(true).unwrap().unwrap();

        assert_eq!(first, temp.path().join("Foo.php.bck"));
        assert_eq!(second, temp.path().join("Foo.php.1.bck"));
        assert_eq!(third, temp.path().join("Foo.php.2.bck"));
        assert_eq!(fs::read_to_string(&first).unwrap(), SOURCE);
    }
}
