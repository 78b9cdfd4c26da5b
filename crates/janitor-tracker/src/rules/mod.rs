//! Cleanup eligibility rules
//!
//! A rule looks at one resource and reports whether it is exempt, should be
//! marked, or is none of the rule's business. Rules perform no I/O; a rule
//! that marks a resource writes the termination fields onto it and the
//! caller persists the change.

mod janitor_tag;

pub use janitor_tag::{parse_termination_date, JanitorTagRule};

use crate::resource::Resource;
use std::sync::Arc;
use tracing::{error, info};

/// Decision of a rule for a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The resource must not be marked
    Exempt,
    /// The rule has no opinion
    NotApplicable,
    /// The rule set the termination fields; the caller should mark it
    MarkForCleanup,
}

impl RuleOutcome {
    pub fn is_mark(&self) -> bool {
        matches!(self, RuleOutcome::MarkForCleanup)
    }
}

/// A cleanup eligibility rule
pub trait Rule: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Decide for `resource`, writing termination fields only when marking
    fn evaluate(&self, resource: &mut Resource) -> RuleOutcome;
}

/// Notable events raised while evaluating a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleDiagnostic {
    /// The owner asked for the resource never to be marked
    DoNotMark { resource_id: String },
    /// The override tag was neither the sentinel nor a date
    MalformedTag {
        resource_id: String,
        tag: String,
        value: String,
    },
}

/// Where rules report diagnostics
pub type DiagnosticSink = Arc<dyn Fn(&RuleDiagnostic) + Send + Sync>;

/// Sink that forwards diagnostics to `tracing`
pub fn tracing_sink() -> DiagnosticSink {
    Arc::new(|diagnostic: &RuleDiagnostic| match diagnostic {
        RuleDiagnostic::DoNotMark { resource_id } => {
            info!(resource_id = %resource_id, "Resource is tagged as not handled by the janitor");
        }
        RuleDiagnostic::MalformedTag {
            resource_id,
            tag,
            value,
        } => {
            error!(
                resource_id = %resource_id,
                tag = %tag,
                value = %value,
                "The janitor tag is not a user specified date"
            );
        }
    })
}
