//! Field exclusion policy.

/// Decides which configured fields never get annotated.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    site_tree_fields: Vec<String>,
    ignore_fields: Vec<String>,
}

impl FieldFilter {
    pub fn new(site_tree_fields: Vec<String>, ignore_fields: Vec<String>) -> Self {
        Self {
            site_tree_fields,
            ignore_fields,
        }
    }

    /// Fields in `ignore_fields` are always excluded. Fields in
    /// `site_tree_fields` are excluded only for page-like classes, which
    /// inherit them from the framework's page base class.
    pub fn is_excluded(&self, field_name: &str, is_site_tree_like: bool) -> bool {
        (is_site_tree_like && self.site_tree_fields.iter().any(|f| f == field_name))
            || self.ignore_fields.iter().any(|f| f == field_name)
    }
}
