//! Fixed column set, flat rows, and the encode/decode steps

use super::registry::DecoderRegistry;
use super::value::SqlValue;
use crate::error::CodecError;
use crate::resource::{fields, normalize_owner_email, FieldMap, Resource, TimestampField};
use janitor_common::{format_timestamp, millis_to_datetime};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Columns of the tracking table, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ResourceId,
    ResourceType,
    Region,
    OwnerEmail,
    Description,
    State,
    TerminationReason,
    ExpectedTerminationTime,
    ActualTerminationTime,
    NotificationTime,
    LaunchTime,
    MarkTime,
    OptOutOfJanitor,
    AdditionalFields,
}

impl Column {
    pub const COUNT: usize = 14;

    pub const ALL: [Column; Column::COUNT] = [
        Column::ResourceId,
        Column::ResourceType,
        Column::Region,
        Column::OwnerEmail,
        Column::Description,
        Column::State,
        Column::TerminationReason,
        Column::ExpectedTerminationTime,
        Column::ActualTerminationTime,
        Column::NotificationTime,
        Column::LaunchTime,
        Column::MarkTime,
        Column::OptOutOfJanitor,
        Column::AdditionalFields,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::ResourceId => fields::RESOURCE_ID,
            Column::ResourceType => fields::RESOURCE_TYPE,
            Column::Region => fields::REGION,
            Column::OwnerEmail => fields::OWNER_EMAIL,
            Column::Description => fields::DESCRIPTION,
            Column::State => fields::STATE,
            Column::TerminationReason => fields::TERMINATION_REASON,
            Column::ExpectedTerminationTime => fields::EXPECTED_TERMINATION_TIME,
            Column::ActualTerminationTime => fields::ACTUAL_TERMINATION_TIME,
            Column::NotificationTime => fields::NOTIFICATION_TIME,
            Column::LaunchTime => fields::LAUNCH_TIME,
            Column::MarkTime => fields::MARK_TIME,
            Column::OptOutOfJanitor => fields::OPT_OUT_OF_JANITOR,
            Column::AdditionalFields => fields::ADDITIONAL_FIELDS,
        }
    }

    /// Declared SQL type, matching existing deployments
    pub fn sql_type(self) -> &'static str {
        match self {
            Column::Region | Column::State => "varchar(25)",
            Column::OptOutOfJanitor => "varchar(8)",
            Column::AdditionalFields => "varchar(4096)",
            c if c.timestamp_field().is_some() => "BIGINT",
            _ => "varchar(255)",
        }
    }

    /// Key columns are never rewritten by an update
    pub fn is_key(self) -> bool {
        matches!(self, Column::ResourceId | Column::Region)
    }

    pub fn timestamp_field(self) -> Option<TimestampField> {
        match self {
            Column::ExpectedTerminationTime => Some(TimestampField::ExpectedTermination),
            Column::ActualTerminationTime => Some(TimestampField::ActualTermination),
            Column::NotificationTime => Some(TimestampField::Notification),
            Column::LaunchTime => Some(TimestampField::Launch),
            Column::MarkTime => Some(TimestampField::Mark),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One stored row, every column read as optional text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRow {
    values: [Option<String>; Column::COUNT],
}

impl ResourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: Column) -> Option<&str> {
        self.values[column.index()].as_deref()
    }

    pub fn set(&mut self, column: Column, value: Option<String>) {
        self.values[column.index()] = value;
    }

    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.set(column, Some(value.into()));
        self
    }
}

/// A resource encoded into bindable column values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    values: Vec<SqlValue>,
}

impl EncodedRow {
    /// Encode every column of `resource`.
    ///
    /// Fails only if the additional fields cannot be serialized.
    pub fn encode(resource: &Resource) -> Result<Self, serde_json::Error> {
        let attributes = encode_attributes(resource)?;

        let values = Column::ALL
            .into_iter()
            .map(|column| match column {
                Column::ResourceId => SqlValue::text(&resource.id),
                Column::ResourceType => SqlValue::text(resource.resource_type.as_str()),
                Column::Region => SqlValue::text(&resource.region),
                Column::OwnerEmail => SqlValue::owner_email(resource.owner_email.as_deref()),
                Column::Description => SqlValue::optional_text(resource.description.as_deref()),
                Column::State => SqlValue::text(resource.state.as_str()),
                Column::TerminationReason => {
                    SqlValue::optional_text(resource.termination_reason.as_deref())
                }
                Column::OptOutOfJanitor => SqlValue::Boolean(resource.opt_out_of_janitor),
                Column::AdditionalFields => SqlValue::text(attributes.as_str()),
                Column::ExpectedTerminationTime => {
                    SqlValue::timestamp(resource.expected_termination_time)
                }
                Column::ActualTerminationTime => SqlValue::timestamp(resource.actual_termination_time),
                Column::NotificationTime => SqlValue::timestamp(resource.notification_time),
                Column::LaunchTime => SqlValue::timestamp(resource.launch_time),
                Column::MarkTime => SqlValue::timestamp(resource.mark_time),
            })
            .collect();

        Ok(Self { values })
    }

    pub fn value(&self, column: Column) -> &SqlValue {
        &self.values[column.index()]
    }

    /// The row as it reads back from storage
    pub fn to_row(&self) -> ResourceRow {
        let mut row = ResourceRow::new();
        for column in Column::ALL {
            row.set(column, self.value(column).to_text());
        }
        row
    }
}

/// Serialize the additional fields of a resource as one JSON object.
///
/// Entries keyed by a fixed column name would be shadowed on read; they are
/// left out of the blob with a warning.
pub fn encode_attributes(resource: &Resource) -> Result<String, serde_json::Error> {
    let attributes: BTreeMap<&str, &str> = resource
        .additional_fields
        .iter()
        .filter(|(key, _)| {
            let reserved = fields::is_reserved(key.as_str());
            if reserved {
                warn!(
                    resource_id = %resource.id,
                    key = %key,
                    "Dropping additional field that collides with a fixed column"
                );
            }
            !reserved
        })
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    serde_json::to_string(&attributes)
}

/// Encode a resource into the row form it is stored as
pub fn encode_row(resource: &Resource) -> Result<ResourceRow, serde_json::Error> {
    Ok(EncodedRow::encode(resource)?.to_row())
}

/// Decode a row with the default decoder
pub fn decode_row(row: &ResourceRow) -> Result<Resource, CodecError> {
    DecoderRegistry::default().decode_row(row)
}

/// Build the field map of a stored row.
///
/// Starts from the additionalFields blob, then overlays the fixed columns.
/// Timestamp columns are rendered as formatted dates; a value that is not
/// a millisecond count is logged and left out.
pub fn row_to_field_map(row: &ResourceRow) -> Result<FieldMap, CodecError> {
    let mut map = match row.get(Column::AdditionalFields) {
        Some(json) => parse_attributes(json)?,
        None => FieldMap::new(),
    };

    for column in Column::ALL {
        let key = column.name();
        let value = match column {
            Column::AdditionalFields => continue,
            Column::OwnerEmail => normalize_owner_email(row.get(column)),
            c if c.timestamp_field().is_some() => {
                row.get(column).and_then(|raw| millis_to_formatted_date(row, column, raw))
            }
            _ => row.get(column).map(str::to_string),
        };

        match value {
            Some(v) => map.insert(key.to_string(), v),
            None => map.remove(key),
        };
    }

    Ok(map)
}

fn parse_attributes(json: &str) -> Result<FieldMap, CodecError> {
    let parsed: Option<serde_json::Map<String, Value>> =
        serde_json::from_str(json).map_err(CodecError::MalformedAttributes)?;

    let mut map = FieldMap::new();
    for (key, value) in parsed.unwrap_or_default() {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(CodecError::NonScalarAttribute(key));
            }
        };
        map.insert(key, value);
    }
    Ok(map)
}

fn millis_to_formatted_date(row: &ResourceRow, column: Column, raw: &str) -> Option<String> {
    let formatted = raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(millis_to_datetime)
        .map(format_timestamp);

    if formatted.is_none() {
        warn!(
            resource_id = row.get(Column::ResourceId).unwrap_or("<unknown>"),
            column = column.name(),
            value = %raw,
            "Error parsing datetime when reading tracked resource"
        );
    }
    formatted
}
