//! Configuration for the tracking store

use janitor_common::defaults::{DEFAULT_MAX_CONNECTIONS, DEFAULT_TABLE};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// database_url field is empty
    #[error("database_url cannot be empty")]
    EmptyDatabaseUrl,

    /// table is not a plain SQL identifier
    #[error("table name must match [A-Za-z_][A-Za-z0-9_]*, got: {0:?}")]
    InvalidTableName(String),

    /// max_connections is zero
    #[error("max_connections must be at least 1")]
    InvalidMaxConnections,
}

/// Connection settings for a [`ResourceTracker`](crate::ResourceTracker)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// sqlx connection string, e.g. `sqlite://state.db?mode=rwc`
    pub database_url: String,
    /// Name of the tracking table
    pub table: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl TrackerConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            table: DEFAULT_TABLE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        validate_table_name(&self.table)?;
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections);
        }
        Ok(())
    }
}

/// Table names are interpolated into statements, so only plain identifiers
/// are accepted.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidTableName(table.to_string()))
    }
}
