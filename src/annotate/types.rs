//! Mapping of database field specs to PHP documentation types.

use phf::phf_map;

/// Database field kind (lower-cased, without arguments) to PHP type.
static SCALAR_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "varchar" => "string",
    "htmlvarchar" => "string",
    "text" => "string",
    "htmltext" => "string",
    "htmlfragment" => "string",
    "enum" => "string",
    "multienum" => "string",
    "date" => "string",
    "datetime" => "string",
    "time" => "string",
    "locale" => "string",
    "percentage" => "float",
    "decimal" => "float",
    "currency" => "float",
    "double" => "float",
    "float" => "float",
    "boolean" => "bool",
    "int" => "int",
    "bigint" => "int",
    "year" => "int",
    "foreignkey" => "int",
};

/// Convert a field spec such as `Varchar(255)` or `Enum("A,B", "A")` to the
/// PHP type used in `@property` lines.
///
/// Unknown kinds pass through lower-cased.
pub fn php_type_for(field_spec: &str) -> String {
    let spec = field_spec.trim().to_lowercase();
    let kind = spec
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");

    match SCALAR_TYPES.get(kind) {
        Some(php_type) => php_type.to_string(),
        None => spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_kinds() {
        assert_eq!(php_type_for("Varchar(255)"), "string");
        assert_eq!(php_type_for("HTMLText"), "string");
        assert_eq!(php_type_for("Enum('Draft,Published', 'Draft')"), "string");
        assert_eq!(php_type_for("Datetime"), "string");
    }

    #[test]
    fn test_numeric_and_boolean_kinds() {
        assert_eq!(php_type_for("Decimal(9,2)"), "float");
        assert_eq!(php_type_for("Currency"), "float");
        assert_eq!(php_type_for("Percentage"), "float");
        assert_eq!(php_type_for("Boolean"), "bool");
        assert_eq!(php_type_for("Int"), "int");
    }

    #[test]
    fn test_unknown_kinds_pass_through_lowercased() {
        assert_eq!(php_type_for("DBFile"), "dbfile");
        assert_eq!(php_type_for("App\\ORM\\GeoPoint"), "app\\orm\\geopoint");
    }
}
