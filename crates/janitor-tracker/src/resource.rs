//! The tracked resource entity
//!
//! A [`Resource`] has strongly typed fixed fields plus an open-ended
//! string-to-string attribute map for kind-specific metadata. The
//! [`FieldMap`] form is the intermediate representation used when decoding
//! rows: fixed fields under their column names, timestamps rendered as
//! formatted dates, and every other key belonging to the attribute map.

use crate::error::CodecError;
use chrono::{DateTime, Utc};
use janitor_common::{format_timestamp, parse_timestamp, CleanupState, ResourceKind};
use std::collections::BTreeMap;
use tracing::warn;

/// Flat name-to-value view of a resource
pub type FieldMap = BTreeMap<String, String>;

/// Field names shared by the field map and the backing table's columns
pub mod fields {
    pub const RESOURCE_ID: &str = "resourceId";
    pub const RESOURCE_TYPE: &str = "resourceType";
    pub const REGION: &str = "region";
    pub const OWNER_EMAIL: &str = "ownerEmail";
    pub const DESCRIPTION: &str = "description";
    pub const STATE: &str = "state";
    pub const TERMINATION_REASON: &str = "terminationReason";
    pub const EXPECTED_TERMINATION_TIME: &str = "expectedTerminationTime";
    pub const ACTUAL_TERMINATION_TIME: &str = "actualTerminationTime";
    pub const NOTIFICATION_TIME: &str = "notificationTime";
    pub const LAUNCH_TIME: &str = "launchTime";
    pub const MARK_TIME: &str = "markTime";
    pub const OPT_OUT_OF_JANITOR: &str = "optOutOfJanitor";
    pub const ADDITIONAL_FIELDS: &str = "additionalFields";

    /// Attribute key holding the provider-side state (e.g. `available`)
    pub const PROVIDER_STATE: &str = "awsResourceState";

    /// Names owned by fixed columns. Attribute entries with these keys are
    /// not written to the attribute blob.
    pub const RESERVED: [&str; 14] = [
        RESOURCE_ID,
        RESOURCE_TYPE,
        REGION,
        OWNER_EMAIL,
        DESCRIPTION,
        STATE,
        TERMINATION_REASON,
        EXPECTED_TERMINATION_TIME,
        ACTUAL_TERMINATION_TIME,
        NOTIFICATION_TIME,
        LAUNCH_TIME,
        MARK_TIME,
        OPT_OUT_OF_JANITOR,
        ADDITIONAL_FIELDS,
    ];

    pub fn is_reserved(key: &str) -> bool {
        RESERVED.contains(&key)
    }
}

/// The five optional lifecycle timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    ExpectedTermination,
    ActualTermination,
    Notification,
    Launch,
    Mark,
}

impl TimestampField {
    pub const ALL: [TimestampField; 5] = [
        TimestampField::ExpectedTermination,
        TimestampField::ActualTermination,
        TimestampField::Notification,
        TimestampField::Launch,
        TimestampField::Mark,
    ];

    /// Field and column name
    pub fn name(self) -> &'static str {
        match self {
            TimestampField::ExpectedTermination => fields::EXPECTED_TERMINATION_TIME,
            TimestampField::ActualTermination => fields::ACTUAL_TERMINATION_TIME,
            TimestampField::Notification => fields::NOTIFICATION_TIME,
            TimestampField::Launch => fields::LAUNCH_TIME,
            TimestampField::Mark => fields::MARK_TIME,
        }
    }
}

/// Normalize an owner email: blank and the legacy sentinel `"0"` mean absent.
pub fn normalize_owner_email(email: Option<&str>) -> Option<String> {
    match email.map(str::trim) {
        None | Some("") | Some("0") => None,
        Some(_) => email.map(str::to_string),
    }
}

/// A cloud resource tracked for cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Provider identifier, stable for the life of the resource
    pub id: String,
    pub region: String,
    pub resource_type: ResourceKind,
    pub state: CleanupState,
    pub description: Option<String>,
    pub owner_email: Option<String>,
    pub termination_reason: Option<String>,
    pub expected_termination_time: Option<DateTime<Utc>>,
    pub actual_termination_time: Option<DateTime<Utc>>,
    pub notification_time: Option<DateTime<Utc>>,
    pub launch_time: Option<DateTime<Utc>>,
    pub mark_time: Option<DateTime<Utc>>,
    pub opt_out_of_janitor: bool,
    /// Kind-specific metadata, persisted as one JSON object.
    ///
    /// Keys named after a fixed column (see [`fields::RESERVED`]) are not
    /// persisted: the column owns that name.
    pub additional_fields: BTreeMap<String, String>,
    /// Owner-supplied tags as seen by discovery. Not persisted.
    pub tags: BTreeMap<String, String>,
}

impl Resource {
    /// Create an unmarked resource with no optional data
    pub fn new(id: impl Into<String>, region: impl Into<String>, resource_type: ResourceKind) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            resource_type,
            state: CleanupState::Unmarked,
            description: None,
            owner_email: None,
            termination_reason: None,
            expected_termination_time: None,
            actual_termination_time: None,
            notification_time: None,
            launch_time: None,
            mark_time: None,
            opt_out_of_janitor: false,
            additional_fields: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_additional_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_provider_state(mut self, state: impl Into<String>) -> Self {
        self.set_provider_state(state);
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn additional_field(&self, key: &str) -> Option<&str> {
        self.additional_fields.get(key).map(String::as_str)
    }

    /// Provider-side state, e.g. `available` or `in-use` for volumes
    pub fn provider_state(&self) -> Option<&str> {
        self.additional_field(fields::PROVIDER_STATE)
    }

    pub fn set_provider_state(&mut self, state: impl Into<String>) {
        self.additional_fields
            .insert(fields::PROVIDER_STATE.to_string(), state.into());
    }

    pub fn timestamp(&self, field: TimestampField) -> Option<DateTime<Utc>> {
        match field {
            TimestampField::ExpectedTermination => self.expected_termination_time,
            TimestampField::ActualTermination => self.actual_termination_time,
            TimestampField::Notification => self.notification_time,
            TimestampField::Launch => self.launch_time,
            TimestampField::Mark => self.mark_time,
        }
    }

    pub fn set_timestamp(&mut self, field: TimestampField, value: Option<DateTime<Utc>>) {
        let slot = match field {
            TimestampField::ExpectedTermination => &mut self.expected_termination_time,
            TimestampField::ActualTermination => &mut self.actual_termination_time,
            TimestampField::Notification => &mut self.notification_time,
            TimestampField::Launch => &mut self.launch_time,
            TimestampField::Mark => &mut self.mark_time,
        };
        *slot = value;
    }

    /// Flatten into a field map.
    ///
    /// Attribute entries come first so fixed fields win on name clashes.
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = self.additional_fields.clone();
        map.insert(fields::RESOURCE_ID.to_string(), self.id.clone());
        map.insert(fields::REGION.to_string(), self.region.clone());
        map.insert(
            fields::RESOURCE_TYPE.to_string(),
            self.resource_type.as_str().to_string(),
        );
        map.insert(fields::STATE.to_string(), self.state.as_str().to_string());
        map.insert(
            fields::OPT_OUT_OF_JANITOR.to_string(),
            self.opt_out_of_janitor.to_string(),
        );

        let optional = [
            (fields::DESCRIPTION, self.description.clone()),
            (
                fields::OWNER_EMAIL,
                normalize_owner_email(self.owner_email.as_deref()),
            ),
            (fields::TERMINATION_REASON, self.termination_reason.clone()),
        ];
        for (key, value) in optional {
            match value {
                Some(v) => map.insert(key.to_string(), v),
                None => map.remove(key),
            };
        }

        for field in TimestampField::ALL {
            match self.timestamp(field) {
                Some(t) => map.insert(field.name().to_string(), format_timestamp(t)),
                None => map.remove(field.name()),
            };
        }

        map
    }

    /// Build a resource from a field map.
    ///
    /// Fixed fields are consumed by name; every remaining entry becomes an
    /// additional field. Identity fields are required. A timestamp that does
    /// not parse as a formatted date is logged and left unset.
    pub fn from_field_map(mut map: FieldMap) -> Result<Self, CodecError> {
        let id = take_required(&mut map, fields::RESOURCE_ID)?;
        let region = take_required(&mut map, fields::REGION)?;
        let type_name = take_required(&mut map, fields::RESOURCE_TYPE)?;
        let resource_type = ResourceKind::parse(&type_name)
            .ok_or(CodecError::UnknownResourceType(type_name))?;

        let mut resource = Resource::new(id, region, resource_type);

        if let Some(state) = map.remove(fields::STATE) {
            resource.state =
                CleanupState::parse(&state).ok_or(CodecError::UnknownState(state))?;
        }

        resource.description = map.remove(fields::DESCRIPTION);
        resource.termination_reason = map.remove(fields::TERMINATION_REASON);
        resource.owner_email =
            normalize_owner_email(map.remove(fields::OWNER_EMAIL).as_deref());
        resource.opt_out_of_janitor = map
            .remove(fields::OPT_OUT_OF_JANITOR)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        for field in TimestampField::ALL {
            let Some(raw) = map.remove(field.name()) else {
                continue;
            };
            match parse_timestamp(&raw) {
                Some(time) => resource.set_timestamp(field, Some(time)),
                None => warn!(
                    resource_id = %resource.id,
                    field = field.name(),
                    value = %raw,
                    "Ignoring unparseable date"
                ),
            }
        }

        map.remove(fields::ADDITIONAL_FIELDS);
        resource.additional_fields = map;
        Ok(resource)
    }
}

fn take_required(map: &mut FieldMap, key: &'static str) -> Result<String, CodecError> {
    map.remove(key).ok_or(CodecError::MissingField(key))
}
