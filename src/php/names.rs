//! Helpers for PHP qualified names.
//!
//! Names are handled as plain strings with `\` as the namespace separator.
//! Fully-qualified names are stored without the leading separator.

/// Namespace separator.
pub const SEPARATOR: char = '\\';

/// Strip a leading root-namespace marker.
pub fn strip_root(name: &str) -> &str {
    name.trim_start_matches(SEPARATOR)
}

/// Prefix a name with the root-namespace marker (`Foo\Bar` -> `\Foo\Bar`).
pub fn root_qualified(name: &str) -> String {
    format!("{}{}", SEPARATOR, strip_root(name))
}

/// Unqualified class name (`Foo\Bar\Baz` -> `Baz`).
pub fn short_name(name: &str) -> &str {
    let name = strip_root(name);
    match name.rfind(SEPARATOR) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Namespace part of a fully-qualified name, empty for the global namespace.
pub fn namespace_of(fqn: &str) -> &str {
    let fqn = strip_root(fqn);
    match fqn.rfind(SEPARATOR) {
        Some(pos) => &fqn[..pos],
        None => "",
    }
}

/// Join a namespace and a relative name.
pub fn join(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", namespace, SEPARATOR, name)
    }
}

/// ASCII case-insensitive comparison of class names, ignoring a leading
/// root marker. PHP class names are case-insensitive.
pub fn same_class(a: &str, b: &str) -> bool {
    strip_root(a).eq_ignore_ascii_case(strip_root(b))
}

/// An import as seen by name resolution: the imported name and the local
/// name it is visible under.
pub trait ImportedName {
    fn imported_name(&self) -> &str;
    fn local_name(&self) -> &str;
}

/// Resolve a class reference the way PHP does for class names.
///
/// - `\Foo\Bar` is already fully qualified.
/// - `namespace\Foo` is relative to the current namespace.
/// - If the first segment matches an import's local name, the import's
///   target replaces it.
/// - Anything else is relative to the current namespace.
pub fn resolve_class<I: ImportedName>(name: &str, namespace: &str, imports: &[I]) -> String {
    if let Some(rest) = name.strip_prefix(SEPARATOR) {
        return rest.to_string();
    }

    if let Some(rest) = name
        .get(..10)
        .filter(|prefix| prefix.eq_ignore_ascii_case("namespace\\"))
        .map(|_| &name[10..])
    {
        return join(namespace, rest);
    }

    let (first, rest) = match name.find(SEPARATOR) {
        Some(pos) => (&name[..pos], Some(&name[pos + 1..])),
        None => (name, None),
    };

    if let Some(import) = imports
        .iter()
        .find(|i| i.local_name().eq_ignore_ascii_case(first))
    {
        return match rest {
            Some(rest) => join(import.imported_name(), rest),
            None => import.imported_name().to_string(),
        };
    }

    join(namespace, name)
}
