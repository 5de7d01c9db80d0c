use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Primary and foreign keys are store-generated 64-bit integers.
pub type Id = i64;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Input formats accepted for activity dates, in the order they are tried.
/// The short `T%H:%M` form is what an HTML `datetime-local` input submits.
const ACCEPTED_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A wall-clock date-time without timezone (call, email and meeting dates).
///
/// Serialized as `YYYY-MM-DDTHH:MM:SS`; deserialization is lenient and also
/// accepts RFC 3339 strings (converted to UTC) and the minute-precision form
/// produced by browser date-time inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime(pub NaiveDateTime);

impl LocalDateTime {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(parsed.naive_utc()));
        }
        ACCEPTED_DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .map(Self)
    }

    pub fn now() -> Self {
        Self(chrono::Utc::now().naive_utc())
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_TIME_FORMAT))
    }
}

impl Serialize for LocalDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time '{}'", raw)))
    }
}

/// One field of an update payload: left out, explicitly `null`, or a value.
///
/// Used with `#[serde(default)]` so that a missing key stays [`Update::Absent`]
/// while `"field": null` becomes [`Update::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Update<T> {
    Absent,
    Null,
    Set(T),
}

impl<T> Default for Update<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Update<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Update<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Set(value),
            None => Self::Null,
        })
    }
}

/// A typed column value ready to be bound to a statement. `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Date(Option<NaiveDate>),
    DateTime(Option<NaiveDateTime>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(v) => v.is_none(),
            Self::Integer(v) => v.is_none(),
            Self::Date(v) => v.is_none(),
            Self::DateTime(v) => v.is_none(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => *v,
            _ => None,
        }
    }

    /// JSON form used in API records; matches how the entity types serialize.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(v) => v.clone().map(Value::String).unwrap_or(Value::Null),
            Self::Integer(v) => v.map(Value::from).unwrap_or(Value::Null),
            Self::Date(v) => v
                .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
                .unwrap_or(Value::Null),
            Self::DateTime(v) => v
                .map(|d| Value::String(LocalDateTime(d).to_string()))
                .unwrap_or(Value::Null),
        }
    }
}

/// Rust types that map onto a [`FieldValue`] variant.
pub trait ColumnValue: Sized {
    fn into_field(value: Option<Self>) -> FieldValue;
}

impl ColumnValue for String {
    fn into_field(value: Option<Self>) -> FieldValue {
        FieldValue::Text(value)
    }
}

impl ColumnValue for i64 {
    fn into_field(value: Option<Self>) -> FieldValue {
        FieldValue::Integer(value)
    }
}

impl ColumnValue for NaiveDate {
    fn into_field(value: Option<Self>) -> FieldValue {
        FieldValue::Date(value)
    }
}

impl ColumnValue for LocalDateTime {
    fn into_field(value: Option<Self>) -> FieldValue {
        FieldValue::DateTime(value.map(|v| v.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub column: &'static str,
    pub value: FieldValue,
}

/// The set of column assignments produced by a create or update payload.
///
/// Column names always come from the entity types, never from request input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    changes: Vec<FieldChange>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always assigns the column, writing NULL for `None`.
    pub fn with<T: ColumnValue>(mut self, column: &'static str, value: Option<T>) -> Self {
        self.changes.push(FieldChange {
            column,
            value: T::into_field(value),
        });
        self
    }

    /// Assigns the column only when a value is given, leaving the store default otherwise.
    pub fn with_present<T: ColumnValue>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(column, Some(value)),
            None => self,
        }
    }

    /// Assigns the column only when the payload mentioned it.
    pub fn with_update<T: ColumnValue>(self, column: &'static str, update: Update<T>) -> Self {
        match update {
            Update::Absent => self,
            Update::Null => self.with::<T>(column, None),
            Update::Set(value) => self.with(column, Some(value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.changes
            .iter()
            .find(|change| change.column == column)
            .map(|change| &change.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes.iter().map(|change| change.column)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        notes: Update<String>,
    }

    #[test]
    fn test_update_distinguishes_absent_null_and_value() {
        let absent: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, Update::Absent);

        let null: Payload = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(null.notes, Update::Null);

        let set: Payload = serde_json::from_str(r#"{"notes": "call back"}"#).unwrap();
        assert_eq!(set.notes, Update::Set("call back".to_string()));
    }

    #[test]
    fn test_local_date_time_accepts_browser_and_rfc3339_inputs() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        for input in [
            "2024-03-05T14:30",
            "2024-03-05T14:30:00",
            "2024-03-05 14:30:00",
            "2024-03-05T14:30:00.000",
            "2024-03-05T14:30:00Z",
            "2024-03-05T16:30:00+02:00",
        ] {
            assert_eq!(
                LocalDateTime::parse(input),
                Some(LocalDateTime(expected)),
                "input {}",
                input
            );
        }

        assert_eq!(LocalDateTime::parse("not a date"), None);
        assert_eq!(LocalDateTime(expected).to_string(), "2024-03-05T14:30:00");
    }

    #[test]
    fn test_changeset_with_update_skips_absent_fields() {
        let changes = Changeset::new()
            .with_update::<String>("nom", Update::Absent)
            .with_update::<String>("notes", Update::Null)
            .with_update("entreprise_id", Update::Set(7_i64));

        assert_eq!(changes.len(), 2);
        assert!(changes.get("nom").is_none());
        assert_eq!(changes.get("notes"), Some(&FieldValue::Text(None)));
        assert_eq!(
            changes.get("entreprise_id").and_then(FieldValue::as_integer),
            Some(7)
        );
    }

    #[test]
    fn test_field_value_json_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(FieldValue::Date(Some(date)).to_json(), Value::from("2024-01-31"));
        assert_eq!(
            FieldValue::DateTime(date.and_hms_opt(9, 5, 0)).to_json(),
            Value::from("2024-01-31T09:05:00")
        );
        assert_eq!(FieldValue::Integer(None).to_json(), Value::Null);
    }
}
