//! Shared test utilities for janitor-tracker
//!
//! ## Modules
//!
//! - [`db`]: In-memory and temp-file SQLite pools

pub mod db;

pub use db::{open_file_test_db, open_test_db, TestDbPool};
