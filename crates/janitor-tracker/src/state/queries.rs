//! Query operations for the tracking store

use super::db::{require_non_empty, ResourceTracker};
use crate::codec::{Column, ResourceRow};
use crate::error::{Result, TrackerError};
use crate::resource::Resource;
use janitor_common::{CleanupState, ResourceKind};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// Filter for [`ResourceTracker::list`]. Region is mandatory; the other
/// fields narrow the result when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    pub region: String,
    pub resource_type: Option<ResourceKind>,
    pub state: Option<CleanupState>,
}

impl ResourceFilter {
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            resource_type: None,
            state: None,
        }
    }

    pub fn with_type(mut self, resource_type: ResourceKind) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn with_state(mut self, state: CleanupState) -> Self {
        self.state = Some(state);
        self
    }
}

impl ResourceTracker {
    /// Look up a resource by its (resourceId, region) key.
    ///
    /// More than one matching row is reported as an integrity violation.
    pub async fn find(&self, resource_id: &str, region: &str) -> Result<Option<Resource>> {
        require_non_empty(resource_id, "resourceId")?;
        require_non_empty(region, "region")?;

        let sql = format!(
            "{} WHERE {} = ? AND {} = ?",
            self.select_clause(),
            Column::ResourceId.name(),
            Column::Region.name()
        );
        let rows = self.fetch_rows(&sql, &[resource_id, region]).await?;
        self.single(rows, resource_id, Some(region))
    }

    /// Look up a resource by id alone, for id spaces unique across regions.
    ///
    /// The same id tracked in two regions is reported as an integrity
    /// violation rather than resolved by picking one.
    pub async fn find_by_id(&self, resource_id: &str) -> Result<Option<Resource>> {
        require_non_empty(resource_id, "resourceId")?;

        let sql = format!(
            "{} WHERE {} = ?",
            self.select_clause(),
            Column::ResourceId.name()
        );
        let rows = self.fetch_rows(&sql, &[resource_id]).await?;
        self.single(rows, resource_id, None)
    }

    /// List resources in a region, optionally narrowed by type and state.
    ///
    /// Rows come back in storage order. One undecodable row fails the whole
    /// query.
    pub async fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        require_non_empty(&filter.region, "region")?;

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(kind) = filter.resource_type {
            conditions.push(format!("{} = ?", Column::ResourceType.name()));
            params.push(kind.as_str());
        }
        if let Some(state) = filter.state {
            conditions.push(format!("{} = ?", Column::State.name()));
            params.push(state.as_str());
        }
        conditions.push(format!("{} = ?", Column::Region.name()));
        params.push(filter.region.as_str());

        let sql = format!("{} WHERE {}", self.select_clause(), conditions.join(" AND "));
        let rows = self.fetch_rows(&sql, &params).await?;

        rows.iter().map(|row| self.decode(row)).collect()
    }

    /// Number of rows stored under a (resourceId, region) key
    pub(super) async fn count_matching(&self, resource_id: &str, region: &str) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND {} = ?",
            self.table,
            Column::ResourceId.name(),
            Column::Region.name()
        );
        debug!(sql = %sql, resource_id = %resource_id, region = %region, "Count query");

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(resource_id)
            .bind(region)
            .fetch_one(&self.pool)
            .await?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Every column is cast to text so timestamp columns holding
    /// non-numeric junk still read back and can be dropped individually.
    fn select_clause(&self) -> String {
        let columns: Vec<String> = Column::ALL
            .iter()
            .map(|c| format!("CAST({name} AS TEXT) AS {name}", name = c.name()))
            .collect();
        format!("SELECT {} FROM {}", columns.join(", "), self.table)
    }

    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<ResourceRow>> {
        debug!(sql = %sql, params = ?params, "Query");

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "Rows fetched");

        rows.iter()
            .map(read_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TrackerError::from)
    }

    fn decode(&self, row: &ResourceRow) -> Result<Resource> {
        self.decoders.decode_row(row).map_err(|e| {
            error!(
                table = %self.table,
                resource_id = row.get(Column::ResourceId).unwrap_or("<unknown>"),
                error = %e,
                "Error parsing resource from result set"
            );
            TrackerError::from(e)
        })
    }

    fn single(
        &self,
        mut rows: Vec<ResourceRow>,
        resource_id: &str,
        region: Option<&str>,
    ) -> Result<Option<Resource>> {
        match rows.len() {
            0 => {
                info!(resource_id = %resource_id, region = ?region, "Resource not found");
                Ok(None)
            }
            1 => rows.pop().map(|row| self.decode(&row)).transpose(),
            count => {
                error!(
                    table = %self.table,
                    resource_id = %resource_id,
                    region = ?region,
                    count,
                    "Multiple rows for a unique resource key"
                );
                Err(TrackerError::IntegrityViolation {
                    resource_id: resource_id.to_string(),
                    region: region.map(str::to_string),
                    count,
                })
            }
        }
    }
}

fn read_row(row: &SqliteRow) -> Result<ResourceRow, sqlx::Error> {
    let mut resource_row = ResourceRow::new();
    for column in Column::ALL {
        resource_row.set(column, row.try_get::<Option<String>, _>(column.name())?);
    }
    Ok(resource_row)
}
