//! Default configuration values shared by the library and CLI

/// Default name of the tracking table
pub const DEFAULT_TABLE: &str = "janitor_resources";

/// Default connection pool size. Access is light periodic batch work.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

/// Application name used for the local data directory
pub const APP_NAME: &str = "janitor-tracker";

/// File name of the default local state database
pub const DEFAULT_DB_FILE: &str = "state.db";
