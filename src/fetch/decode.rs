use chrono::NaiveDate;
use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;
use serde_json::Value;

use crate::utils::time::{date_from_epoch_millis, parse_calendar_date};

/// Render an identifier that may arrive as a JSON string or number.
pub fn value_to_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers are normally JSON numbers; some collectors store them as strings.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|number| number.is_finite())
}

/// Dates come as text, epoch milliseconds, or Mongo extended JSON (`{"$date": ...}`).
pub fn value_to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_calendar_date(s),
        Value::Number(n) => n.as_i64().and_then(date_from_epoch_millis),
        Value::Object(map) => map
            .get("$date")
            .or_else(|| map.get("$numberLong"))
            .and_then(|inner| match inner {
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(date_from_epoch_millis)
                    .or_else(|| parse_calendar_date(s)),
                other => value_to_date(other),
            }),
        _ => None,
    }
}

pub(crate) fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_label(&value)
        .ok_or_else(|| D::Error::custom(format!("expected an identifier, found `{value}`")))
}

pub(crate) fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_f64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, found `{value}`")))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_date(&value)
        .ok_or_else(|| D::Error::custom(format!("unrecognised date `{value}`")))
}
