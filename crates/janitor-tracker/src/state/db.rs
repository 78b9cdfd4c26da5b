//! Database setup and schema management

use crate::codec::{Column, DecoderRegistry};
use crate::config::{validate_table_name, TrackerConfig};
use crate::error::{Result, TrackerError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Database connection pool type alias
pub type DbPool = SqlitePool;

/// Open the connection pool described by `config`, creating the database
/// file if needed
pub async fn open_db(config: &TrackerConfig) -> Result<DbPool> {
    config.validate()?;

    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Durable record of tracked resources, keyed by (resourceId, region)
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct ResourceTracker {
    pub(super) pool: DbPool,
    pub(super) table: String,
    pub(super) decoders: DecoderRegistry,
}

impl ResourceTracker {
    /// Wrap an existing pool. The table name must be a plain identifier.
    pub fn new(pool: DbPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            pool,
            table,
            decoders: DecoderRegistry::default(),
        })
    }

    /// Open a pool from `config` and make sure the table exists
    pub async fn connect(config: &TrackerConfig) -> Result<Self> {
        let pool = open_db(config).await?;
        let tracker = Self::new(pool, config.table.clone())?;
        tracker.ensure_schema().await;
        Ok(tracker)
    }

    /// Replace the row decoders used by lookups
    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the tracking table if it does not exist.
    ///
    /// Failures are logged and swallowed so a pre-existing table keeps the
    /// store usable. Returns whether the table statement succeeded.
    pub async fn ensure_schema(&self) -> bool {
        info!(table = %self.table, "Creating tracking table");

        let sql = self.create_table_sql();
        debug!(sql = %sql, "Create table statement");
        if let Err(e) = sqlx::query(&sql).execute(&self.pool).await {
            warn!(table = %self.table, error = %e, "Error while trying to auto-create tracking table");
            return false;
        }

        // Best effort: legacy tables may already hold duplicate keys
        let index_sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_identity ON {table} ({id}, {region})",
            table = self.table,
            id = Column::ResourceId.name(),
            region = Column::Region.name(),
        );
        debug!(sql = %index_sql, "Create index statement");
        if let Err(e) = sqlx::query(&index_sql).execute(&self.pool).await {
            warn!(
                table = %self.table,
                error = %e,
                "Could not create unique (resourceId, region) index"
            );
        }

        true
    }

    fn create_table_sql(&self) -> String {
        let columns: Vec<String> = Column::ALL
            .iter()
            .map(|c| format!("{} {}", c.name(), c.sql_type()))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            columns.join(", ")
        )
    }
}

/// Reject empty identity arguments
pub(super) fn require_non_empty(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::InvalidArgument(name));
    }
    Ok(())
}

/// Tracker over a fresh in-memory database with the schema in place
#[cfg(test)]
pub(crate) async fn open_test_tracker() -> ResourceTracker {
    let pool = janitor_test_utils::open_test_db().await.unwrap();
    let tracker = ResourceTracker::new(pool, "janitor_resources").unwrap();
    assert!(tracker.ensure_schema().await);
    tracker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use janitor_common::ResourceKind;

    #[tokio::test]
    async fn test_schema_has_exact_columns() {
        let tracker = open_test_tracker().await;

        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('janitor_resources') ORDER BY cid")
                .fetch_all(tracker.pool())
                .await
                .unwrap();

        let expected: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_schema_declared_types() {
        let tracker = open_test_tracker().await;

        let types: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, type FROM pragma_table_info('janitor_resources') ORDER BY cid",
        )
        .fetch_all(tracker.pool())
        .await
        .unwrap();

        let lookup = |name: &str| {
            types
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t.to_lowercase())
                .unwrap()
        };
        assert_eq!(lookup("region"), "varchar(25)");
        assert_eq!(lookup("launchTime"), "bigint");
        assert_eq!(lookup("additionalFields"), "varchar(4096)");
    }

    #[tokio::test]
    async fn test_ensure_schema_idempotent() {
        let tracker = open_test_tracker().await;
        assert!(tracker.ensure_schema().await);
        assert!(tracker.ensure_schema().await);
    }

    #[tokio::test]
    async fn test_schema_visible_across_connections() {
        let (_dir, pool) = janitor_test_utils::open_file_test_db(3).await.unwrap();
        let tracker = ResourceTracker::new(pool, "shared").unwrap();
        assert!(tracker.ensure_schema().await);

        let mut conns = Vec::new();
        for _ in 0..3 {
            conns.push(tracker.pool().acquire().await.unwrap());
        }
        for conn in &mut conns {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shared")
                .fetch_one(&mut **conn)
                .await
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_failure_is_not_fatal() {
        let tracker = open_test_tracker().await;
        tracker.pool().close().await;

        // Closed pool: statement fails, call returns instead of erroring
        assert!(!tracker.ensure_schema().await);
    }

    #[tokio::test]
    async fn test_legacy_table_with_duplicates_keeps_working() {
        let pool = janitor_test_utils::open_test_db().await.unwrap();
        let tracker = ResourceTracker::new(pool, "legacy").unwrap();

        sqlx::query(&tracker.create_table_sql())
            .execute(tracker.pool())
            .await
            .unwrap();
        for _ in 0..2 {
            sqlx::query(
                "INSERT INTO legacy (resourceId, resourceType, region, state) \
                 VALUES ('vol-dup', 'EBS_VOLUME', 'us-east-1', 'UNMARKED')",
            )
            .execute(tracker.pool())
            .await
            .unwrap();
        }

        // Unique index cannot be built, but the table is usable
        assert!(tracker.ensure_schema().await);

        let err = tracker.find("vol-dup", "us-east-1").await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::IntegrityViolation { ref resource_id, region: Some(ref region), count: 2 }
                if resource_id == "vol-dup" && region == "us-east-1"
        ));

        let resource = Resource::new("vol-dup", "us-east-1", ResourceKind::EbsVolume);
        let err = tracker.upsert(&resource).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::IntegrityViolation { ref resource_id, region: Some(ref region), count: 2 }
                if resource_id == "vol-dup" && region == "us-east-1"
        ));

        // Neither call wrote anything
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM legacy")
            .fetch_one(tracker.pool())
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_new_rejects_bad_table_name() {
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let err = ResourceTracker::new(pool, "resources; DROP TABLE x").unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("vol-1", "resourceId").is_ok());
        assert!(matches!(
            require_non_empty(" ", "region"),
            Err(TrackerError::InvalidArgument("region"))
        ));
    }
}
