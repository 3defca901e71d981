//! Capture-batch container decoding.
//!
//! Capture batches are Avro object container files (the schema travels in
//! the file header). Each container record carries a `Body` field holding
//! one UTF-8 JSON event payload; the payload's keys become the fields of
//! one [`RawRecord`].

use crate::error::{Error, Result};
use crate::record::RawRecord;
use apache_avro::types::Value as AvroValue;
use apache_avro::Reader;

/// Container-record field that carries the JSON payload.
pub const BODY_FIELD: &str = "Body";

/// Decode one capture batch into raw event records.
///
/// Decode failure is fatal for the batch: a corrupt container indicates an
/// upstream writer bug and must be surfaced, not skipped.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let reader = Reader::new(bytes).map_err(|e| Error::Avro(e.to_string()))?;

    let mut records = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|e| Error::Avro(e.to_string()))?;
        let body = body_text(entry)?;
        records.push(parse_body(&body)?);
    }
    Ok(records)
}

/// Extract the `Body` field of one container record as text.
///
/// The capture writer emits `Body` as Avro `bytes`; `string` is accepted
/// as well since both carry the same UTF-8 JSON payload.
fn body_text(entry: AvroValue) -> Result<String> {
    let AvroValue::Record(entry_fields) = entry else {
        return Err(Error::Avro("container entry is not a record".to_string()));
    };

    for (name, value) in entry_fields {
        if name == BODY_FIELD {
            return match value {
                AvroValue::Bytes(bytes) => {
                    String::from_utf8(bytes).map_err(|_| Error::BodyNotText)
                }
                AvroValue::String(text) => Ok(text),
                _ => Err(Error::BodyNotText),
            };
        }
    }
    Err(Error::MissingField { field: BODY_FIELD })
}

/// Parse one `Body` JSON object into a raw record.
fn parse_body(body: &str) -> Result<RawRecord> {
    let payload: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
    Ok(RawRecord::from_json_object(&payload))
}
