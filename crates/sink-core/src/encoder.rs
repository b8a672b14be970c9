//! Turns a batch into the single JSON array document sent with each INSERT.

use model::records::{batch::Batch, record::Record};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use std::fmt;

/// A serialized JSON array, one object per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDocument(String);

impl JsonDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders `batch` as a JSON array in record order.
///
/// Each object keeps its fields in their original order and carries the
/// event time as float epoch seconds under `time_key`. If a record already
/// has that key, the timestamp takes its value in place.
pub fn encode(batch: &Batch, time_key: &str) -> Result<JsonDocument, serde_json::Error> {
    let json = serde_json::to_string(&EncodedBatch { batch, time_key })?;
    Ok(JsonDocument(json))
}

struct EncodedBatch<'a> {
    batch: &'a Batch,
    time_key: &'a str,
}

struct EncodedRecord<'a> {
    record: &'a Record,
    time_key: &'a str,
}

impl Serialize for EncodedBatch<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.batch.len()))?;
        for record in self.batch.iter() {
            seq.serialize_element(&EncodedRecord {
                record,
                time_key: self.time_key,
            })?;
        }
        seq.end()
    }
}

impl Serialize for EncodedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = &self.record.fields;
        let timestamp = self.record.epoch_seconds();
        let has_time_key = fields.contains_key(self.time_key);
        let len = fields.len() + usize::from(!has_time_key);

        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in fields {
            if key == self.time_key {
                map.serialize_entry(key, &timestamp)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        if !has_time_key {
            map.serialize_entry(self.time_key, &timestamp)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::encode;
    use chrono::{TimeZone, Utc};
    use model::records::{batch::Batch, record::Record};
    use serde_json::{Value, json};

    fn record(secs: i64, nanos: u32, fields: Value) -> Record {
        let ts = Utc.timestamp_opt(secs, nanos).unwrap();
        Record::from_value(ts, fields).unwrap()
    }

    #[test]
    fn test_encode_empty_batch() {
        let doc = encode(&Batch::default(), "date").unwrap();
        assert_eq!(doc.as_str(), "[]");
    }

    #[test]
    fn test_encode_single_record() {
        let batch = Batch::new("app", vec![record(1_700_000_000, 250_000_000, json!({"msg": "hello"}))]);
        let doc = encode(&batch, "date").unwrap();
        assert_eq!(doc.as_str(), r#"[{"msg":"hello","date":1700000000.25}]"#);
    }

    #[test]
    fn test_encode_keeps_record_and_field_order() {
        let batch = Batch::new(
            "app",
            vec![
                record(1, 0, json!({"z": 1, "a": {"nested": [1, 2]}, "m": null})),
                record(2, 0, json!({"b": "second"})),
                record(3, 0, json!({})),
            ],
        );

        let doc = encode(&batch, "date").unwrap();
        let parsed: Value = serde_json::from_str(doc.as_str()).unwrap();
        let rows = parsed.as_array().unwrap();

        assert_eq!(rows.len(), batch.len());
        let keys: Vec<_> = rows[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m", "date"]);
        assert_eq!(rows[0]["a"], json!({"nested": [1, 2]}));
        assert_eq!(rows[1]["b"], "second");
        assert_eq!(rows[2], json!({"date": 3.0}));
    }

    #[test]
    fn test_timestamp_is_written_as_float() {
        let batch = Batch::new("app", vec![record(1_700_000_000, 0, json!({"msg": "x"}))]);
        let doc = encode(&batch, "ts").unwrap();
        assert!(doc.as_str().contains(r#""ts":1700000000.0"#));
    }

    #[test]
    fn test_existing_time_key_is_replaced_in_place() {
        let batch = Batch::new(
            "app",
            vec![record(10, 0, json!({"date": "yesterday", "msg": "hi"}))],
        );
        let doc = encode(&batch, "date").unwrap();
        assert_eq!(doc.as_str(), r#"[{"date":10.0,"msg":"hi"}]"#);
    }

    #[test]
    fn test_strings_with_quotes_stay_valid_json() {
        let batch = Batch::new("app", vec![record(1, 0, json!({"msg": "it's \"quoted\""}))]);
        let doc = encode(&batch, "date").unwrap();
        let parsed: Value = serde_json::from_str(doc.as_str()).unwrap();
        assert_eq!(parsed[0]["msg"], "it's \"quoted\"");
    }
}
