//! Scalar values bound into statements

use crate::resource::normalize_owner_email;
use chrono::{DateTime, Utc};

/// A single column value, as bound into an insert or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Text(String),
    /// Timestamps, as milliseconds since the epoch
    Integer(i64),
    /// Stored as `"true"` / `"false"`
    Boolean(bool),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::text)
    }

    /// Owner emails that are blank or the legacy `"0"` are written as NULL
    pub fn owner_email(value: Option<&str>) -> Self {
        normalize_owner_email(value).map_or(SqlValue::Null, SqlValue::Text)
    }

    pub fn timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(SqlValue::Null, |t| SqlValue::Integer(t.timestamp_millis()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// The text a column holds once this value is stored
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Boolean(b) => Some(b.to_string()),
        }
    }
}
