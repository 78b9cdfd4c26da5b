//! janitor-tracker: inspect the janitor resource tracking table
//!
//! Creates the tracking table and lists or shows tracked resources. The
//! tool is read-only apart from table creation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use directories::ProjectDirs;
use janitor_common::defaults::{APP_NAME, DEFAULT_DB_FILE, DEFAULT_MAX_CONNECTIONS, DEFAULT_TABLE};
use janitor_common::format_timestamp;
use janitor_tracker::state::open_db;
use janitor_tracker::{
    CleanupState, Resource, ResourceFilter, ResourceKind, ResourceTracker, TrackerConfig,
};
use std::fs;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "janitor-tracker")]
#[command(about = "Inspect resources tracked for janitor cleanup")]
#[command(version)]
struct Args {
    /// sqlx database URL (default: local state database)
    #[arg(long, env = "JANITOR_DATABASE_URL")]
    database_url: Option<String>,

    /// Tracking table name
    #[arg(long, env = "JANITOR_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tracking table if it does not exist
    Init,

    /// List tracked resources in a region
    List {
        /// Region to list (required)
        #[arg(long)]
        region: String,

        /// Only this resource type (e.g. EBS_VOLUME)
        #[arg(long = "type")]
        resource_type: Option<ResourceKind>,

        /// Only this cleanup state (e.g. MARKED)
        #[arg(long)]
        state: Option<CleanupState>,
    },

    /// Show one tracked resource
    Show {
        resource_id: String,

        /// Region of the resource; without it the id must be unique
        #[arg(long)]
        region: Option<String>,
    },
}

/// Default database URL under the user's local data directory
fn default_database_url() -> Result<String> {
    let proj_dirs =
        ProjectDirs::from("", "", APP_NAME).context("Failed to get project directories")?;

    let state_dir = proj_dirs.data_local_dir();
    fs::create_dir_all(state_dir).context("Failed to create state directory")?;

    Ok(format!(
        "sqlite://{}?mode=rwc",
        state_dir.join(DEFAULT_DB_FILE).display()
    ))
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(format_timestamp).unwrap_or_default()
}

fn print_resources(resources: &[Resource]) {
    if resources.is_empty() {
        println!("No tracked resources");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Type"),
            Cell::new("ID"),
            Cell::new("Region"),
            Cell::new("State"),
            Cell::new("Owner"),
            Cell::new("Expected termination"),
            Cell::new("Opt-out"),
        ]);

    for resource in resources {
        table.add_row(vec![
            Cell::new(resource.resource_type.as_str()),
            Cell::new(&resource.id),
            Cell::new(&resource.region),
            Cell::new(resource.state.as_str()),
            Cell::new(resource.owner_email.as_deref().unwrap_or("")),
            Cell::new(format_time(resource.expected_termination_time)),
            Cell::new(resource.opt_out_of_janitor),
        ]);
    }

    println!("{table}");
}

fn print_resource(resource: &Resource) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Field"), Cell::new("Value")]);

    // Field map renders timestamps and merges in the additional fields
    for (key, value) in resource.to_field_map() {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    println!("{table}");
}

/// Open the tracker and provision its table once, reporting whether the
/// table is usable.
async fn open_tracker(config: &TrackerConfig) -> Result<(ResourceTracker, bool)> {
    let pool = open_db(config)
        .await
        .context("Failed to open tracking database")?;
    let tracker = ResourceTracker::new(pool, config.table.clone())?;
    info!(table = %tracker.table(), "Connected to tracking database");

    let schema_ready = tracker.ensure_schema().await;
    Ok((tracker, schema_ready))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let database_url = match args.database_url {
        Some(url) => url,
        None => default_database_url()?,
    };
    let config = TrackerConfig::new(database_url)
        .with_table(args.table)
        .with_max_connections(args.max_connections);

    let (tracker, schema_ready) = open_tracker(&config).await?;

    match args.command {
        Command::Init => {
            if schema_ready {
                println!("Tracking table '{}' is ready", tracker.table());
            } else {
                println!(
                    "Could not create tracking table '{}' (see warnings)",
                    tracker.table()
                );
            }
        }
        Command::List {
            region,
            resource_type,
            state,
        } => {
            let mut filter = ResourceFilter::region(region);
            filter.resource_type = resource_type;
            filter.state = state;
            let resources = tracker.list(&filter).await?;
            print_resources(&resources);
        }
        Command::Show {
            resource_id,
            region,
        } => {
            let found = match region {
                Some(region) => tracker.find(&resource_id, &region).await?,
                None => tracker.find_by_id(&resource_id).await?,
            };
            match found {
                Some(resource) => print_resource(&resource),
                None => println!("Resource {resource_id} not found"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_tracker_provisions_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = TrackerConfig::new(format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("state.db").display()
        ))
        .with_table("cli_resources");

        let (tracker, schema_ready) = open_tracker(&config).await.unwrap();
        assert!(schema_ready);

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'cli_resources'",
        )
        .fetch_one(tracker.pool())
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }
}
