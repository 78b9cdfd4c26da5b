//! janitor-tracker - Resource tracking for cloud janitors
//!
//! Records the cleanup lifecycle of cloud resources in a relational table
//! and decides, through owner-supplied tags, whether idle resources should
//! be exempted from or scheduled for cleanup.
//!
//! ## Modules
//!
//! - [`resource`]: The tracked resource entity and its field map form
//! - [`codec`]: Row encoding/decoding and per-kind decoders
//! - [`state`]: The SQLite-backed tracking store
//! - [`rules`]: Cleanup eligibility rules
//! - [`config`]: Store configuration
//! - [`error`]: Typed errors

pub mod codec;
pub mod config;
pub mod error;
pub mod resource;
pub mod rules;
pub mod state;

pub use config::TrackerConfig;
pub use error::{CodecError, TrackerError};
pub use resource::Resource;
pub use rules::{JanitorTagRule, Rule, RuleOutcome};
pub use state::{ResourceFilter, ResourceTracker, UpsertOutcome};

pub use janitor_common::{CleanupState, ResourceKind};
