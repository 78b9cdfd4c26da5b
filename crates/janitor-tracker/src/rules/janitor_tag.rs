//! Owner override through the `janitor` tag
//!
//! Owners of idle resources can tag them with `janitor=donotmark` to opt
//! out, or with `janitor=YYYY-MM-DD` to schedule termination on that date.

use super::{tracing_sink, DiagnosticSink, Rule, RuleDiagnostic, RuleOutcome};
use crate::resource::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use janitor_common::tags::{DO_NOT_MARK, JANITOR_TAG, TERMINATION_DATE_FORMAT, VOLUME_AVAILABLE};
use janitor_common::ResourceKind;
use std::fmt;

/// Parse a user specified termination date (`2024-03-15`) as midnight UTC.
///
/// Only the exact `YYYY-MM-DD` shape is accepted.
pub fn parse_termination_date(value: &str) -> Option<DateTime<Utc>> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }

    NaiveDate::parse_from_str(value, TERMINATION_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Honors owner overrides on idle resources of one kind.
///
/// By default governs EBS volumes, which are idle when their provider state
/// is `available` (not attached to any instance).
#[derive(Clone)]
pub struct JanitorTagRule {
    governed: ResourceKind,
    tag_key: String,
    do_not_mark: String,
    idle_state: String,
    sink: DiagnosticSink,
}

impl Default for JanitorTagRule {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JanitorTagRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JanitorTagRule")
            .field("governed", &self.governed)
            .field("tag_key", &self.tag_key)
            .field("do_not_mark", &self.do_not_mark)
            .field("idle_state", &self.idle_state)
            .finish_non_exhaustive()
    }
}

impl JanitorTagRule {
    pub fn new() -> Self {
        Self {
            governed: ResourceKind::EbsVolume,
            tag_key: JANITOR_TAG.to_string(),
            do_not_mark: DO_NOT_MARK.to_string(),
            idle_state: VOLUME_AVAILABLE.to_string(),
            sink: tracing_sink(),
        }
    }

    /// Govern a different resource kind
    pub fn for_kind(mut self, kind: ResourceKind) -> Self {
        self.governed = kind;
        self
    }

    pub fn with_tag_key(mut self, key: impl Into<String>) -> Self {
        self.tag_key = key.into();
        self
    }

    pub fn with_do_not_mark(mut self, value: impl Into<String>) -> Self {
        self.do_not_mark = value.into();
        self
    }

    /// Provider state meaning the resource is not in use
    pub fn with_idle_state(mut self, state: impl Into<String>) -> Self {
        self.idle_state = state.into();
        self
    }

    pub fn with_sink(mut self, sink: DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn governed(&self) -> ResourceKind {
        self.governed
    }
}

impl Rule for JanitorTagRule {
    fn name(&self) -> &str {
        "janitor-tag"
    }

    fn evaluate(&self, resource: &mut Resource) -> RuleOutcome {
        if resource.resource_type != self.governed {
            return RuleOutcome::NotApplicable;
        }

        // In-use resources are never marked here
        if resource.provider_state() != Some(self.idle_state.as_str()) {
            return RuleOutcome::Exempt;
        }

        let Some(value) = resource.tag(&self.tag_key).map(str::to_string) else {
            return RuleOutcome::NotApplicable;
        };

        if value == self.do_not_mark {
            (self.sink)(&RuleDiagnostic::DoNotMark {
                resource_id: resource.id.clone(),
            });
            return RuleOutcome::Exempt;
        }

        match parse_termination_date(&value) {
            Some(date) => {
                resource.expected_termination_time = Some(date);
                resource.termination_reason =
                    Some(format!("User specified termination date {value}"));
                RuleOutcome::MarkForCleanup
            }
            None => {
                (self.sink)(&RuleDiagnostic::MalformedTag {
                    resource_id: resource.id.clone(),
                    tag: self.tag_key.clone(),
                    value,
                });
                RuleOutcome::NotApplicable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use janitor_common::millis_to_datetime;
    use std::sync::{Arc, Mutex};

    fn idle_volume() -> Resource {
        Resource::new("vol-abc", "us-east-1", ResourceKind::EbsVolume)
            .with_provider_state("available")
    }

    fn capturing_rule() -> (JanitorTagRule, Arc<Mutex<Vec<RuleDiagnostic>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let rule = JanitorTagRule::new().with_sink(Arc::new(move |d: &RuleDiagnostic| {
            sink_seen.lock().unwrap().push(d.clone());
        }));
        (rule, seen)
    }

    #[test]
    fn test_do_not_mark_is_exempt() {
        let (rule, seen) = capturing_rule();
        let mut resource = idle_volume().with_tag("janitor", "donotmark");
        let before = resource.clone();

        assert_eq!(rule.evaluate(&mut resource), RuleOutcome::Exempt);
        assert_eq!(resource, before);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[RuleDiagnostic::DoNotMark {
                resource_id: "vol-abc".to_string()
            }]
        );
    }

    #[test]
    fn test_user_date_marks_resource() {
        let (rule, seen) = capturing_rule();
        let mut resource = idle_volume().with_tag("janitor", "2024-03-15");

        let outcome = rule.evaluate(&mut resource);

        assert_eq!(outcome, RuleOutcome::MarkForCleanup);
        assert!(outcome.is_mark());
        assert_eq!(
            resource.expected_termination_time,
            millis_to_datetime(1_710_460_800_000)
        );
        let reason = resource.termination_reason.unwrap();
        assert!(reason.contains("2024-03-15"), "{reason}");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_tag_leaves_resource_untouched() {
        let (rule, seen) = capturing_rule();
        let mut resource = idle_volume().with_tag("janitor", "not-a-date");
        resource.expected_termination_time = millis_to_datetime(1_000);
        resource.termination_reason = Some("earlier reason".to_string());
        let before = resource.clone();

        assert_eq!(rule.evaluate(&mut resource), RuleOutcome::NotApplicable);
        assert_eq!(resource, before);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[RuleDiagnostic::MalformedTag {
                resource_id: "vol-abc".to_string(),
                tag: "janitor".to_string(),
                value: "not-a-date".to_string(),
            }]
        );
    }

    #[test]
    fn test_impossible_date_is_malformed() {
        let (rule, _) = capturing_rule();
        for value in ["2024-02-30", "2024-13-01", "2024-3-15", "24-03-15", "2024/03/15"] {
            let mut resource = idle_volume().with_tag("janitor", value);
            assert_eq!(
                rule.evaluate(&mut resource),
                RuleOutcome::NotApplicable,
                "{value}"
            );
            assert!(resource.expected_termination_time.is_none());
        }
    }

    #[test]
    fn test_ungoverned_type_not_applicable() {
        let (rule, seen) = capturing_rule();
        for tag in ["donotmark", "2024-03-15", "garbage"] {
            let mut resource = Resource::new("i-1", "us-east-1", ResourceKind::Instance)
                .with_provider_state("available")
                .with_tag("janitor", tag);
            let before = resource.clone();
            assert_eq!(rule.evaluate(&mut resource), RuleOutcome::NotApplicable);
            assert_eq!(resource, before);
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_attached_volume_is_exempt() {
        let (rule, _) = capturing_rule();
        let mut resource = Resource::new("vol-used", "us-east-1", ResourceKind::EbsVolume)
            .with_provider_state("in-use")
            .with_tag("janitor", "2024-03-15");

        assert_eq!(rule.evaluate(&mut resource), RuleOutcome::Exempt);
        assert!(resource.expected_termination_time.is_none());
    }

    #[test]
    fn test_unknown_provider_state_is_exempt() {
        let (rule, _) = capturing_rule();
        let mut resource = Resource::new("vol-x", "us-east-1", ResourceKind::EbsVolume)
            .with_tag("janitor", "2024-03-15");
        assert_eq!(rule.evaluate(&mut resource), RuleOutcome::Exempt);
    }

    #[test]
    fn test_missing_tag_not_applicable() {
        let (rule, _) = capturing_rule();
        let mut resource = idle_volume().with_tag("owner", "someone");
        assert_eq!(rule.evaluate(&mut resource), RuleOutcome::NotApplicable);
    }

    #[test]
    fn test_custom_configuration() {
        let (rule, _) = capturing_rule();
        let rule = rule
            .for_kind(ResourceKind::EbsSnapshot)
            .with_tag_key("cleanup")
            .with_do_not_mark("keep")
            .with_idle_state("completed");
        assert_eq!(rule.governed(), ResourceKind::EbsSnapshot);

        let mut kept = Resource::new("snap-1", "us-east-1", ResourceKind::EbsSnapshot)
            .with_provider_state("completed")
            .with_tag("cleanup", "keep");
        assert_eq!(rule.evaluate(&mut kept), RuleOutcome::Exempt);

        let mut dated = Resource::new("snap-2", "us-east-1", ResourceKind::EbsSnapshot)
            .with_provider_state("completed")
            .with_tag("cleanup", "2025-01-01");
        assert_eq!(rule.evaluate(&mut dated), RuleOutcome::MarkForCleanup);
    }

    #[test]
    fn test_rule_as_trait_object() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(JanitorTagRule::default())];
        let mut resource = idle_volume().with_tag("janitor", "2030-12-31");
        let outcomes: Vec<_> = rules.iter().map(|r| r.evaluate(&mut resource)).collect();
        assert_eq!(outcomes, vec![RuleOutcome::MarkForCleanup]);
        assert_eq!(rules[0].name(), "janitor-tag");
    }

    #[test]
    fn test_parse_termination_date() {
        assert_eq!(
            parse_termination_date("2024-03-15"),
            millis_to_datetime(1_710_460_800_000)
        );
        assert!(parse_termination_date("2024-03-15 ").is_none());
        assert!(parse_termination_date("").is_none());
    }
}
