use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Response body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Invalid data format received: expected a JSON object")]
    NotAnObject,

    #[error("Missing daily weather data")]
    MissingDaily,

    #[error("Missing or invalid {field} data")]
    MissingSeries { field: &'static str },

    #[error("Invalid {field} value at index {index}: {found}")]
    InvalidValue {
        field: &'static str,
        index: usize,
        found: String,
    },

    // Each series must line up with `time`
    #[error("Inconsistent data received: {field} has {found} entries, time has {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}
