//! SQLite-backed tracking store for janitor resources
//!
//! Uses sqlx for async database access with a small connection pool.

mod crud;
mod db;
mod queries;

pub use crud::UpsertOutcome;
pub use db::{open_db, DbPool, ResourceTracker};
pub use queries::ResourceFilter;
