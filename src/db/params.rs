//! Parameter binding.
//!
//! [`bind`] maps a runtime JSON value to exactly one [`BindValue`] tag, and
//! the per-driver functions push a bound value onto a database-specific
//! query. The mapping is total: every input produces a tag.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::types::Json;
use sqlx::{MySql, Postgres, Sqlite};

/// A driver-ready value with its bind type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64 for maximum range)
    Int(i64),
    /// Text value; floats and other scalars pass through here as text
    Text(String),
    /// Structured value, transmitted as JSON text
    Json(JsonValue),
    /// Pre-serialized binary payload. Callers choose the serialization
    /// format explicitly; the engine never invents one.
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Tag name, for logging and tests.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Text(_) => "text",
            Self::Json(_) => "json-text",
            Self::Bytes(_) => "serialized-blob",
        }
    }
}

/// Binary payloads travel as base64 in serialized form.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// A named placeholder with its typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: BindValue,
}

impl BoundParameter {
    pub fn new(name: impl Into<String>, value: BindValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Infer the bind type for a runtime value.
///
/// Integer numbers bind as integers; float numbers pass through as text
/// (numeric-as-text, no precision guessing); arrays and objects travel as
/// JSON text.
pub fn bind(name: impl Into<String>, value: &JsonValue) -> BoundParameter {
    let bound = match value {
        JsonValue::Null => BindValue::Null,
        JsonValue::Bool(b) => BindValue::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BindValue::Int(i),
            None => BindValue::Text(n.to_string()),
        },
        JsonValue::String(s) => BindValue::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => BindValue::Json(value.clone()),
    };
    BoundParameter::new(name, bound)
}

/// Bind a value to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    value: &'q BindValue,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match value {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.as_str()),
        BindValue::Json(v) => query.bind(Json(v)),
        BindValue::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a value to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &'q BindValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match value {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.as_str()),
        BindValue::Json(v) => query.bind(Json(v)),
        BindValue::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a value to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q BindValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(v) => query.bind(*v),
        BindValue::Int(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.as_str()),
        // SQLite has no native JSON type, store as string
        BindValue::Json(v) => query.bind(v.to_string()),
        BindValue::Bytes(v) => query.bind(v.as_slice()),
    }
}
