//! SQL type tags for inferred columns.
//!
//! The canonical model stores column types as [`SqlType`], serialized as a
//! lowercase tag (`"uuid"`, `"text[]"`, `"unknown"`). DDL rendering goes
//! through [`fmt::Display`], which produces Postgres type names.
//!
//! `Unknown` records "a column was referenced but nothing said what it holds".
//! It is kept in the model and snapshot and rendered as `TEXT`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Postgres-level column type tag.
///
/// The derived ordering is only used to break ties between equally
/// authoritative observations; it carries no notion of "better".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SqlType {
    /// Referenced but untyped.
    Unknown,

    Boolean,

    /// 32-bit integer.
    Integer,

    /// 64-bit integer.
    BigInt,

    Real,

    DoublePrecision,

    Numeric,

    Text,

    Date,

    /// Timestamp with time zone.
    Timestamp,

    Uuid,

    /// Opaque structured value.
    Jsonb,

    Bytea,

    /// One-dimensional array of the element type.
    Array(Box<SqlType>),
}

impl SqlType {
    /// Parse a type tag.
    ///
    /// Accepts the tags produced by [`SqlType::tag`] plus common aliases.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry::sql::SqlType;
    ///
    /// assert_eq!(SqlType::parse("int4"), Some(SqlType::Integer));
    /// assert_eq!(SqlType::parse("text[]"), Some(SqlType::Array(Box::new(SqlType::Text))));
    /// assert_eq!(SqlType::parse("varchar(3)"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();

        if let Some(element) = s.strip_suffix("[]") {
            return Self::parse(element).map(|t| SqlType::Array(Box::new(t)));
        }

        match s.as_str() {
            "unknown" => Some(SqlType::Unknown),
            "bool" | "boolean" => Some(SqlType::Boolean),
            "int" | "int4" | "integer" => Some(SqlType::Integer),
            "int8" | "bigint" => Some(SqlType::BigInt),
            "real" | "float4" => Some(SqlType::Real),
            "float8" | "double precision" => Some(SqlType::DoublePrecision),
            "numeric" | "decimal" => Some(SqlType::Numeric),
            "text" => Some(SqlType::Text),
            "date" => Some(SqlType::Date),
            "timestamp" | "timestamptz" | "timestamp with time zone" => Some(SqlType::Timestamp),
            "uuid" => Some(SqlType::Uuid),
            "json" | "jsonb" => Some(SqlType::Jsonb),
            "bytea" => Some(SqlType::Bytea),
            _ => None,
        }
    }

    /// Lowercase tag used in snapshots and reports.
    pub fn tag(&self) -> String {
        match self {
            SqlType::Unknown => "unknown".to_string(),
            SqlType::Boolean => "boolean".to_string(),
            SqlType::Integer => "integer".to_string(),
            SqlType::BigInt => "bigint".to_string(),
            SqlType::Real => "real".to_string(),
            SqlType::DoublePrecision => "double precision".to_string(),
            SqlType::Numeric => "numeric".to_string(),
            SqlType::Text => "text".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Timestamp => "timestamp".to_string(),
            SqlType::Uuid => "uuid".to_string(),
            SqlType::Jsonb => "jsonb".to_string(),
            SqlType::Bytea => "bytea".to_string(),
            SqlType::Array(element) => format!("{}[]", element.tag()),
        }
    }

    /// Returns true unless this is [`SqlType::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, SqlType::Unknown)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Unknown | SqlType::Text => write!(f, "TEXT"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Real => write!(f, "REAL"),
            SqlType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            SqlType::Numeric => write!(f, "NUMERIC"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Timestamp => write!(f, "TIMESTAMPTZ"),
            SqlType::Uuid => write!(f, "UUID"),
            SqlType::Jsonb => write!(f, "JSONB"),
            SqlType::Bytea => write!(f, "BYTEA"),
            SqlType::Array(element) => write!(f, "{}[]", element),
        }
    }
}

impl From<SqlType> for String {
    fn from(t: SqlType) -> Self {
        t.tag()
    }
}

impl TryFrom<String> for SqlType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SqlType::parse(&s).ok_or_else(|| format!("unrecognized SQL type tag '{}'", s))
    }
}
