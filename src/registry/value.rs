//! Model configuration values.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Configuration keys that declare fields and relations on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    Db,
    HasOne,
    BelongsTo,
    HasMany,
    ManyMany,
    BelongsManyMany,
}

/// List class returned by `has_many` relation getters.
pub const HAS_MANY_LIST: &str = "SilverStripe\\ORM\\HasManyList";
/// List class returned by `many_many` / `belongs_many_many` getters.
pub const MANY_MANY_LIST: &str = "SilverStripe\\ORM\\ManyManyList";
/// Generic list class.
pub const DATA_LIST: &str = "SilverStripe\\ORM\\DataList";

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::Db,
        ConfigKey::HasOne,
        ConfigKey::BelongsTo,
        ConfigKey::HasMany,
        ConfigKey::ManyMany,
        ConfigKey::BelongsManyMany,
    ];

    /// Keys documented as `@property` lines, in output order.
    pub const PROPERTY_KEYS: [ConfigKey; 3] = [ConfigKey::Db, ConfigKey::HasOne, ConfigKey::BelongsTo];

    /// Keys documented as `@method` lines, in output order.
    pub const METHOD_KEYS: [ConfigKey; 3] = [
        ConfigKey::HasMany,
        ConfigKey::ManyMany,
        ConfigKey::BelongsManyMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Db => "db",
            ConfigKey::HasOne => "has_one",
            ConfigKey::BelongsTo => "belongs_to",
            ConfigKey::HasMany => "has_many",
            ConfigKey::ManyMany => "many_many",
            ConfigKey::BelongsManyMany => "belongs_many_many",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "db" => Some(ConfigKey::Db),
            "has_one" => Some(ConfigKey::HasOne),
            "belongs_to" => Some(ConfigKey::BelongsTo),
            "has_many" => Some(ConfigKey::HasMany),
            "many_many" => Some(ConfigKey::ManyMany),
            "belongs_many_many" => Some(ConfigKey::BelongsManyMany),
            _ => None,
        }
    }

    /// List class used for relation getters declared under this key.
    pub fn list_type(&self) -> &'static str {
        match self {
            ConfigKey::HasMany => HAS_MANY_LIST,
            ConfigKey::ManyMany | ConfigKey::BelongsManyMany => MANY_MANY_LIST,
            _ => DATA_LIST,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value in a model configuration array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A type spec or class name, e.g. `Varchar(255)` or `App\Team`.
    Str(String),
    /// A structured descriptor such as `['through' => ..., 'from' => ..., 'to' => ...]`.
    Map(IndexMap<String, ConfigValue>),
    /// A list without keys.
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Member of a structured descriptor.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, ConfigValue::Str(_))
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

/// Field name to configured value, in declaration order.
pub type FieldConfig = IndexMap<String, ConfigValue>;
