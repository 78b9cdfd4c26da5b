//! janitor-common - Shared types and utilities
//!
//! Vocabulary shared by the tracker library, its CLI and test helpers,
//! without any database dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`cleanup_state`]: Lifecycle state of a tracked resource
//! - [`defaults`]: Default configuration values
//! - [`resource_kind`]: Kinds of cloud resources the janitor tracks
//! - [`tags`]: Owner-supplied tag keys and values understood by rules

pub mod cleanup_state;
pub mod defaults;
pub mod resource_kind;
pub mod tags;

// Re-export commonly used types
pub use cleanup_state::CleanupState;
pub use resource_kind::ResourceKind;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Convert epoch milliseconds into a UTC timestamp.
///
/// Returns `None` for values outside chrono's representable range.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Format a timestamp the way tracked resources render dates.
///
/// RFC 3339 in UTC with millisecond precision, e.g. `2024-03-15T00:00:00.000Z`.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp produced by [`format_timestamp`] (any RFC 3339 is accepted).
///
/// Years past 9999 are rendered with a sign (`+10000-01-01T..Z`), which
/// RFC 3339 does not allow; those go through the `%Y` parser instead.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ").map(|dt| dt.and_utc())
        })
        .ok()
}
