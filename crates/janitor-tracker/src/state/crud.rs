//! Insert-or-update of tracked resources

use super::db::{require_non_empty, ResourceTracker};
use crate::codec::{Column, EncodedRow, SqlValue};
use crate::error::{Result, TrackerError};
use crate::resource::Resource;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use tracing::{debug, error};

/// What [`ResourceTracker::upsert`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting: a new row was written
    Inserted,
    /// Re-sighting: the existing row was rewritten in place
    Updated,
}

impl ResourceTracker {
    /// Save a resource, inserting on first sighting and updating otherwise.
    ///
    /// If the additional fields cannot be serialized nothing is written.
    /// The existence check and the write are separate statements; racing
    /// writers on the same key are resolved by the table's unique index
    /// when it exists.
    pub async fn upsert(&self, resource: &Resource) -> Result<UpsertOutcome> {
        require_non_empty(&resource.id, "resourceId")?;
        require_non_empty(&resource.region, "region")?;

        let encoded = EncodedRow::encode(resource).map_err(|source| {
            error!(
                resource_id = %resource.id,
                region = %resource.region,
                error = %source,
                "Error generating additional field JSON when saving resource"
            );
            TrackerError::Serialization {
                resource_id: resource.id.clone(),
                source,
            }
        })?;

        debug!(
            resource_id = %resource.id,
            table = %self.table,
            region = %resource.region,
            "Saving resource"
        );

        let outcome = match self.count_matching(&resource.id, &resource.region).await? {
            0 => {
                self.insert_resource(&encoded).await?;
                UpsertOutcome::Inserted
            }
            1 => {
                self.update_resource(&encoded).await?;
                UpsertOutcome::Updated
            }
            count => {
                return Err(TrackerError::IntegrityViolation {
                    resource_id: resource.id.clone(),
                    region: Some(resource.region.clone()),
                    count,
                })
            }
        };

        debug!(resource_id = %resource.id, outcome = ?outcome, "Successfully saved");
        Ok(outcome)
    }

    async fn insert_resource(&self, encoded: &EncodedRow) -> Result<()> {
        let names: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        let placeholders = vec!["?"; names.len()];
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders.join(", ")
        );
        debug!(sql = %sql, params = ?encoded, "Insert statement");

        let mut query = sqlx::query(&sql);
        for column in Column::ALL {
            query = bind_value(query, encoded.value(column));
        }
        let result = query.execute(&self.pool).await?;

        debug!(rows = result.rows_affected(), "Rows inserted");
        Ok(())
    }

    /// Rewrite every mutable column; the key columns select the row
    async fn update_resource(&self, encoded: &EncodedRow) -> Result<()> {
        let mutable: Vec<Column> = Column::ALL.into_iter().filter(|c| !c.is_key()).collect();
        let assignments: Vec<String> = mutable
            .iter()
            .map(|c| format!("{} = ?", c.name()))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? AND {} = ?",
            self.table,
            assignments.join(", "),
            Column::ResourceId.name(),
            Column::Region.name()
        );
        debug!(sql = %sql, params = ?encoded, "Update statement");

        let mut query = sqlx::query(&sql);
        for column in mutable
            .into_iter()
            .chain([Column::ResourceId, Column::Region])
        {
            query = bind_value(query, encoded.value(column));
        }
        let result = query.execute(&self.pool).await?;

        debug!(rows = result.rows_affected(), "Rows updated");
        Ok(())
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Boolean(b) => query.bind(b.to_string()),
    }
}
