//! The field tree: the value model every other module works on.
//!
//! Content documents are nested mappings and sequences of scalars. The tree is
//! a closed union so resolution can dispatch on the variant explicitly:
//!
//! ```text
//! Field::Mapping({
//!     "title":    Scalar("Hello"),
//!     "title@fr": Scalar("Bonjour"),
//!     "links":    Sequence([Mapping({ "label": .., "label@de": .. })]),
//! })
//! ```
//!
//! Mappings are [`IndexMap`]s so the authored key order survives parsing and
//! serialization. Order is significant: among equally specific overrides the
//! later-declared key wins.
//!
//! The serde representation is untagged, so any JSON document deserializes
//! straight into a [`Fields`] value and serializes back to the same shape.
//! TOML goes through [`fields_from_toml`] instead: its datetimes have no
//! scalar serde form and become strings in their TOML spelling.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered mapping level of the field tree.
pub type Fields = IndexMap<String, Field>;

/// A node in the field tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Scalar(Scalar),
    Sequence(Vec<Field>),
    Mapping(Fields),
}

/// Leaf values. Integers are tried before floats so `1` stays an integer,
/// and integers past `i64::MAX` land in `Unsigned` rather than losing
/// precision as floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl Field {
    pub fn null() -> Self {
        Field::Scalar(Scalar::Null)
    }

    pub fn as_mapping(&self) -> Option<&Fields> {
        match self {
            Field::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Field::Sequence(_))
    }
}

impl From<toml::Value> for Field {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Field::Scalar(Scalar::String(s)),
            toml::Value::Integer(n) => Field::Scalar(Scalar::Integer(n)),
            toml::Value::Float(n) => Field::Scalar(Scalar::Float(n)),
            toml::Value::Boolean(b) => Field::Scalar(Scalar::Bool(b)),
            toml::Value::Datetime(dt) => Field::Scalar(Scalar::String(dt.to_string())),
            toml::Value::Array(items) => {
                Field::Sequence(items.into_iter().map(Field::from).collect())
            }
            toml::Value::Table(table) => Field::Mapping(fields_from_toml(table)),
        }
    }
}

/// Convert a parsed TOML table into a mapping level, keeping key order.
pub fn fields_from_toml(table: toml::Table) -> Fields {
    table.into_iter().map(|(key, value)| (key, Field::from(value))).collect()
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Field {
    fn from(n: i64) -> Self {
        Field::Scalar(Scalar::Integer(n))
    }
}

impl From<u64> for Field {
    fn from(n: u64) -> Self {
        Field::Scalar(Scalar::Unsigned(n))
    }
}

impl From<f64> for Field {
    fn from(n: f64) -> Self {
        Field::Scalar(Scalar::Float(n))
    }
}

impl From<Vec<Field>> for Field {
    fn from(items: Vec<Field>) -> Self {
        Field::Sequence(items)
    }
}

impl From<Fields> for Field {
    fn from(fields: Fields) -> Self {
        Field::Mapping(fields)
    }
}
