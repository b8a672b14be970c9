use crate::records::error::RecordError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded event: when it happened plus its fields in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, fields: Map<String, Value>) -> Self {
        Record { timestamp, fields }
    }

    /// Accepts only JSON objects; scalars and arrays are not records.
    pub fn from_value(timestamp: DateTime<Utc>, value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Record::new(timestamp, fields)),
            Value::Null => Err(RecordError::NotAnObject("null")),
            Value::Bool(_) => Err(RecordError::NotAnObject("a boolean")),
            Value::Number(_) => Err(RecordError::NotAnObject("a number")),
            Value::String(_) => Err(RecordError::NotAnObject("a string")),
            Value::Array(_) => Err(RecordError::NotAnObject("an array")),
        }
    }

    pub fn from_json(timestamp: DateTime<Utc>, line: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(line)?;
        Record::from_value(timestamp, value)
    }

    /// Seconds since the Unix epoch with sub-second precision.
    pub fn epoch_seconds(&self) -> f64 {
        self.timestamp.timestamp() as f64
            + f64::from(self.timestamp.timestamp_subsec_nanos()) / 1_000_000_000.0
    }
}
