//! Run watermark: the resume cursor between ingestion runs.

use crate::sink::MetadataSink;
use serde::{Deserialize, Serialize};

/// Well-known metadata key the watermark is stored under.
pub const WATERMARK_KEY: &str = "events_metadata.json";

/// First and last batch committed by one ingestion run.
///
/// Both fields are `None` when the listing was empty; `last_file` stays
/// `None` when every listed batch was a skipped placeholder. The next run
/// passes `last_file` as its `after` cursor. The comparison is strictly
/// greater-than, so a resumed run never re-reads that batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// First batch name the run saw.
    pub first_file: Option<String>,
    /// Last batch name the run committed.
    pub last_file: Option<String>,
}

/// Persist the watermark, best-effort.
///
/// The event table produced by the run is already valid, so a failed
/// metadata write is reported and swallowed rather than failing the run.
pub fn emit(sink: &dyn MetadataSink, key: &str, watermark: &Watermark) {
    match sink.write(key, watermark) {
        Ok(()) => tracing::info!(
            "watermark persisted under '{}': {:?} .. {:?}",
            key,
            watermark.first_file,
            watermark.last_file
        ),
        Err(e) => tracing::warn!("failed to persist watermark under '{}': {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    struct FailingSink;

    impl MetadataSink for FailingSink {
        fn write(&self, _key: &str, _watermark: &Watermark) -> Result<()> {
            Err(std::io::Error::other("sink down").into())
        }

        fn load(&self, _key: &str) -> Result<Option<Watermark>> {
            Ok(None)
        }
    }

    #[test]
    fn test_emit_swallows_sink_failure() {
        let watermark = Watermark {
            first_file: Some("a.avro".to_string()),
            last_file: Some("b.avro".to_string()),
        };
        // Must not panic or propagate.
        emit(&FailingSink, WATERMARK_KEY, &watermark);
    }

    #[test]
    fn test_watermark_json_shape() {
        let watermark = Watermark {
            first_file: Some("a.avro".to_string()),
            last_file: None,
        };
        let json = serde_json::to_string(&watermark).unwrap();
        assert_eq!(json, r#"{"first_file":"a.avro","last_file":null}"#);
    }
}
