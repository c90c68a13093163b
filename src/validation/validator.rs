//! Structural validation of archive response bodies.
//!
//! The archive answers with loosely typed JSON. Nothing leaves this module unless
//! every required series is present, typed, and exactly as long as `time`.

use crate::types::daily_weather::DailyWeather;
use crate::validation::error::SchemaError;
use chrono::NaiveDate;
use serde_json::{Map, Value};

const TIME: &str = "time";
const TEMP_MAX: &str = "temperature_2m_max";
const TEMP_MIN: &str = "temperature_2m_min";
const TEMP_MEAN: &str = "temperature_2m_mean";
const APPARENT_TEMP_MAX: &str = "apparent_temperature_max";
const APPARENT_TEMP_MIN: &str = "apparent_temperature_min";
const APPARENT_TEMP_MEAN: &str = "apparent_temperature_mean";

/// The daily metrics requested from the archive, in request order.
pub const DAILY_METRICS: [&str; 6] = [
    TEMP_MAX,
    TEMP_MIN,
    TEMP_MEAN,
    APPARENT_TEMP_MAX,
    APPARENT_TEMP_MIN,
    APPARENT_TEMP_MEAN,
];

/// Validates a decoded response body and converts it into [`DailyWeather`].
///
/// Checks run in this order: the body is an object, `daily` is an object,
/// `time` and all six metric series are arrays, every series has `time`'s
/// length, and finally each element has the right type (`YYYY-MM-DD` string
/// for `time`, number or `null` for the metrics).
///
/// Empty arrays are valid and describe a zero-day range.
///
/// # Errors
///
/// Returns the [`SchemaError`] describing the first failed check.
pub fn validate_daily(raw: &Value) -> Result<DailyWeather, SchemaError> {
    let body = raw.as_object().ok_or(SchemaError::NotAnObject)?;
    let daily = body
        .get("daily")
        .and_then(Value::as_object)
        .ok_or(SchemaError::MissingDaily)?;

    let time = array(daily, TIME)?;
    let series = DAILY_METRICS
        .iter()
        .map(|&field| array(daily, field).map(|values| (field, values)))
        .collect::<Result<Vec<_>, _>>()?;

    for &(field, values) in &series {
        if values.len() != time.len() {
            return Err(SchemaError::LengthMismatch {
                field,
                expected: time.len(),
                found: values.len(),
            });
        }
    }

    let numbers = |field: &'static str| -> Result<Vec<Option<f64>>, SchemaError> {
        array(daily, field)?
            .iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(n.as_f64()),
                other => Err(invalid(field, index, other)),
            })
            .collect()
    };

    Ok(DailyWeather {
        time: dates(time)?,
        temp_max: numbers(TEMP_MAX)?,
        temp_min: numbers(TEMP_MIN)?,
        temp_mean: numbers(TEMP_MEAN)?,
        apparent_temp_max: numbers(APPARENT_TEMP_MAX)?,
        apparent_temp_min: numbers(APPARENT_TEMP_MIN)?,
        apparent_temp_mean: numbers(APPARENT_TEMP_MEAN)?,
    })
}

fn array<'a>(
    daily: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, SchemaError> {
    daily
        .get(field)
        .and_then(Value::as_array)
        .ok_or(SchemaError::MissingSeries { field })
}

fn dates(values: &[Value]) -> Result<Vec<NaiveDate>, SchemaError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or_else(|| invalid(TIME, index, value))
        })
        .collect()
}

fn invalid(field: &'static str, index: usize, value: &Value) -> SchemaError {
    SchemaError::InvalidValue {
        field,
        index,
        found: value.to_string(),
    }
}
