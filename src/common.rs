//! Common types and utilities shared across handlers and services.
//!
//! Dashboard forms post ids and quantities as strings as often as numbers, so
//! request bodies read those fields through [`deserialize_lenient_number`] and
//! services convert them with the helpers below.

use crate::errors::ServiceError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads an optional JSON number or numeric string.
///
/// `null`, a missing field and a blank string become `None`. Anything that is
/// not a number (garbage strings, booleans, objects) becomes `Some(NaN)` so the
/// caller can report the field as invalid rather than failing the whole body.
pub fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.parse::<f64>().unwrap_or(f64::NAN))
            }
        }
        Some(_) => Some(f64::NAN),
    })
}

/// The value as an integer, if it is finite and has no fractional part.
pub fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// A usable record id: a whole number of at least 1.
pub fn record_id(value: Option<f64>) -> Option<i64> {
    value.and_then(whole_number).filter(|id| *id >= 1)
}

/// Parses a record id from a path segment or CLI argument.
pub fn parse_record_id(raw: &str) -> Option<i64> {
    record_id(raw.trim().parse::<f64>().ok())
}

/// Id as written by older dashboards, which stamped alerts with millisecond
/// timestamps plus a random fraction. The fraction is dropped.
pub fn legacy_record_id(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite())
        .map(f64::trunc)
        .and_then(whole_number)
        .filter(|id| *id >= 1)
}

/// Reads a stored record id that may be an integer or a fractional legacy id.
pub fn deserialize_legacy_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Number(n) => n.as_i64().or_else(|| legacy_record_id(n.as_f64())),
        _ => None,
    };
    id.ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {}", value)))
}

/// Collects the names of fields whose value did not parse and fails with
/// [`ServiceError::MissingField`] listing all of them.
#[derive(Debug, Default)]
pub struct FieldCheck {
    missing: Vec<&'static str>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    pub fn require_id(&mut self, name: &'static str, value: Option<f64>) -> i64 {
        self.require(name, record_id(value)).unwrap_or_default()
    }

    pub fn require_text(&mut self, name: &'static str, value: Option<&str>) -> String {
        let value = value.map(str::trim).filter(|s| !s.is_empty());
        self.require(name, value).unwrap_or_default().to_string()
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::MissingField(self.missing.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "deserialize_lenient_number")]
        value: Option<f64>,
    }

    fn parse(raw: &str) -> Option<f64> {
        serde_json::from_str::<Body>(raw).unwrap().value
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(parse(r#"{"value": 4}"#), Some(4.0));
        assert_eq!(parse(r#"{"value": " 12 "}"#), Some(12.0));
        assert_eq!(parse(r#"{"value": 2.5}"#), Some(2.5));
    }

    #[test]
    fn absent_null_and_blank_are_none() {
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"value": null}"#), None);
        assert_eq!(parse(r#"{"value": ""}"#), None);
    }

    #[test]
    fn garbage_becomes_nan() {
        assert!(parse(r#"{"value": "ten"}"#).unwrap().is_nan());
        assert!(parse(r#"{"value": true}"#).unwrap().is_nan());
    }

    #[test]
    fn record_ids_must_be_positive_whole_numbers() {
        assert_eq!(record_id(Some(3.0)), Some(3));
        assert_eq!(record_id(Some(0.0)), None);
        assert_eq!(record_id(Some(-2.0)), None);
        assert_eq!(record_id(Some(1.5)), None);
        assert_eq!(record_id(Some(f64::NAN)), None);
        assert_eq!(record_id(None), None);
        assert_eq!(parse_record_id(" 7 "), Some(7));
        assert_eq!(parse_record_id("x"), None);
    }

    #[test]
    fn legacy_ids_drop_their_fraction() {
        assert_eq!(legacy_record_id(Some(1717000000000.123)), Some(1717000000000));
        assert_eq!(legacy_record_id(Some(4.0)), Some(4));
        assert_eq!(legacy_record_id(Some(0.5)), None);
        assert_eq!(legacy_record_id(Some(f64::INFINITY)), None);

        #[derive(Deserialize)]
        struct Stored {
            #[serde(deserialize_with = "deserialize_legacy_id")]
            id: i64,
        }
        let parse = |raw: &str| serde_json::from_str::<Stored>(raw).map(|s| s.id);
        assert_eq!(parse(r#"{"id": 12}"#).unwrap(), 12);
        assert_eq!(parse(r#"{"id": 1717000000000.987}"#).unwrap(), 1717000000000);
        assert!(parse(r#"{"id": "abc"}"#).is_err());
        assert!(parse(r#"{"id": -1}"#).is_err());
    }

    #[test]
    fn field_check_lists_every_missing_field() {
        let mut check = FieldCheck::new();
        check.require_id("productId", Some(1.0));
        check.require_id("fromWarehouseId", None);
        check.require_text("message", Some("  "));

        assert_matches!(check.finish(), Err(ServiceError::MissingField(fields)) => {
            assert_eq!(fields, "fromWarehouseId, message");
        });
    }
}
