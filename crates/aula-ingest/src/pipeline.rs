//! Ingestion controller.
//!
//! Drives listing and decoding across capture batches in name order,
//! accumulating decoded records under a record-count ceiling and tracking
//! the first/last batch committed as the run watermark.
//!
//! # Ceiling
//!
//! The ceiling bounds the accumulated record count, not the per-batch
//! count: whole batches are always decoded and committed, and the check
//! runs only after a batch has been committed ("commit last, then stop").
//! The check is also suppressed until `min_files` listed batches have been
//! passed, so a single oversized first file cannot end the run on its own.

use crate::sink::ArchiveSink;
use crate::source::BatchStore;
use crate::watermark::Watermark;
use crate::{Error, Result};
use aula_core::{decode_batch, RawRecord};
use metrics::counter;
use tracing::{debug, info};

/// Limits that bound one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    /// Maximum accumulated record count before early stop is permitted.
    pub max_events: usize,

    /// Listed batches that must be passed before the ceiling may stop the
    /// run.
    pub min_files: usize,

    /// Batches at or under this size are placeholder captures (header,
    /// no events) and are skipped without decoding.
    pub empty_batch_max_bytes: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            min_files: 2,
            empty_batch_max_bytes: 508,
        }
    }
}

/// Statistics from one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Batches the listing returned.
    pub files_listed: usize,

    /// Batches decoded and committed.
    pub files_committed: usize,

    /// Placeholder batches skipped by the size threshold.
    pub files_skipped: usize,

    /// Event records committed.
    pub events: usize,

    /// Raw bytes read from committed batches.
    pub bytes_read: usize,

    /// Whether the record ceiling ended the run before the listing did.
    pub stopped_early: bool,
}

/// Everything one ingestion run produces.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Decoded records of all committed batches, in file order.
    pub records: Vec<RawRecord>,

    /// First/last batch bookkeeping for the next run's cursor.
    pub watermark: Watermark,

    /// Run statistics.
    pub stats: IngestStats,
}

/// Run one ingestion pass over `store`.
///
/// Lists batches whose name strictly exceeds `after`, then streams through
/// them in name order: placeholder batches are skipped, every other batch
/// is decoded whole and committed (records appended, `last_file` advanced,
/// raw bytes mirrored to `archive` when configured) before the ceiling
/// check may stop the loop.
///
/// Any listing, read, or decode failure aborts the whole run: partial
/// ingestion without a correct watermark would cause permanent gaps or
/// duplicate reprocessing on resume.
pub fn ingest(
    store: &dyn BatchStore,
    after: &str,
    limits: &IngestLimits,
    archive: Option<&dyn ArchiveSink>,
) -> Result<IngestOutcome> {
    let entries = store.list(after)?;
    info!(
        "{}: {} batches after cursor '{}'",
        store.name(),
        entries.len(),
        after
    );

    let mut outcome = IngestOutcome {
        stats: IngestStats {
            files_listed: entries.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    let Some(first) = entries.first() else {
        return Ok(outcome);
    };
    outcome.watermark.first_file = Some(first.name.clone());

    for (index, entry) in entries.iter().enumerate() {
        if entry.size <= limits.empty_batch_max_bytes {
            debug!(
                "skipping placeholder batch {} ({} bytes)",
                entry.name, entry.size
            );
            outcome.stats.files_skipped += 1;
            counter!("ingest_batches_skipped_total").increment(1);
            continue;
        }

        let bytes = store.read(&entry.name)?;
        let batch = decode_batch(&bytes).map_err(|e| Error::MalformedBatch {
            name: entry.name.clone(),
            source: e,
        })?;
        debug!("decoded {}: {} events", entry.name, batch.len());

        outcome.stats.files_committed += 1;
        outcome.stats.events += batch.len();
        outcome.stats.bytes_read += bytes.len();
        counter!("ingest_batches_total").increment(1);
        counter!("ingest_events_total").increment(batch.len() as u64);
        counter!("ingest_bytes_total").increment(bytes.len() as u64);

        outcome.records.extend(batch);
        outcome.watermark.last_file = Some(entry.name.clone());

        // Archive after the commit so a mirror write never races a
        // watermark that excludes its batch.
        if let Some(sink) = archive {
            sink.write(&entry.name, &bytes)?;
        }

        if outcome.records.len() > limits.max_events && index + 1 > limits.min_files {
            info!(
                "record ceiling reached after {} ({} events), stopping",
                entry.name,
                outcome.records.len()
            );
            outcome.stats.stopped_early = true;
            break;
        }
    }

    info!(
        "ingested {} events from {} batches ({} skipped)",
        outcome.stats.events, outcome.stats.files_committed, outcome.stats.files_skipped
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryArchive;
    use crate::source::MemoryStore;
    use apache_avro::types::{Record, Value as AvroValue};
    use apache_avro::{Schema, Writer};
    use serde_json::json;

    const CAPTURE_SCHEMA: &str = r#"{
        "type": "record",
        "name": "EventData",
        "fields": [
            {"name": "SequenceNumber", "type": "long"},
            {"name": "Body", "type": "bytes"}
        ]
    }"#;

    /// Container with `count` minimal event payloads.
    fn batch_bytes(count: usize) -> Vec<u8> {
        let schema = Schema::parse_str(CAPTURE_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for seq in 0..count {
            let payload = json!({
                "percentage": "50",
                "timestamp": format!("{}", 1_700_000_000 + seq),
                "url": "/la/author1/unit1",
            });
            let mut record = Record::new(writer.schema()).unwrap();
            record.put("SequenceNumber", seq as i64);
            record.put("Body", AvroValue::Bytes(payload.to_string().into_bytes()));
            writer.append(record).unwrap();
        }
        writer.into_inner().unwrap()
    }

    /// Store whose batches all report a size above the skip threshold.
    fn store_with(batches: &[(&str, usize)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (name, count) in batches {
            store.insert_with_size(*name, batch_bytes(*count), 10_000);
        }
        store
    }

    fn limits(max_events: usize) -> IngestLimits {
        IngestLimits {
            max_events,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_listing() {
        let store = MemoryStore::new();
        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.watermark, Watermark::default());
        assert_eq!(outcome.stats.files_listed, 0);
    }

    #[test]
    fn test_ingest_in_name_order() {
        let store = store_with(&[("b.avro", 2), ("a.avro", 3)]);
        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();

        assert_eq!(outcome.records.len(), 5);
        assert_eq!(outcome.watermark.first_file.as_deref(), Some("a.avro"));
        assert_eq!(outcome.watermark.last_file.as_deref(), Some("b.avro"));
        assert_eq!(outcome.stats.files_committed, 2);
        assert!(!outcome.stats.stopped_early);
    }

    #[test]
    fn test_placeholder_batches_are_never_decoded() {
        let mut store = MemoryStore::new();
        // Garbage bytes would fail decoding if the threshold did not skip them.
        store.insert_with_size("a.avro", b"not avro".to_vec(), 508);
        store.insert_with_size("b.avro", batch_bytes(2), 10_000);

        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stats.files_skipped, 1);
        assert_eq!(outcome.watermark.first_file.as_deref(), Some("a.avro"));
        assert_eq!(outcome.watermark.last_file.as_deref(), Some("b.avro"));
    }

    #[test]
    fn test_trailing_placeholder_does_not_advance_last_file() {
        let mut store = MemoryStore::new();
        store.insert_with_size("a.avro", batch_bytes(2), 10_000);
        store.insert_with_size("b.avro", b"not avro".to_vec(), 100);

        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();
        assert_eq!(outcome.watermark.last_file.as_deref(), Some("a.avro"));
    }

    #[test]
    fn test_all_placeholders_leaves_last_file_unset() {
        let mut store = MemoryStore::new();
        store.insert_with_size("a.avro", Vec::new(), 0);
        store.insert_with_size("b.avro", Vec::new(), 508);

        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.watermark.first_file.as_deref(), Some("a.avro"));
        assert_eq!(outcome.watermark.last_file, None);
    }

    #[test]
    fn test_ceiling_commits_last_batch_then_stops() {
        let store = store_with(&[
            ("a.avro", 6),
            ("b.avro", 6),
            ("c.avro", 1),
            ("d.avro", 5),
        ]);

        let outcome = ingest(&store, "", &limits(10), None).unwrap();

        // a: 6 <= 10, continue. b: 12 > 10 but only the 2nd listed batch,
        // floor suppresses the stop. c: 13 > 10 and past the floor - c is
        // still committed, then the loop stops; d is never read.
        assert_eq!(outcome.records.len(), 13);
        assert_eq!(outcome.stats.files_committed, 3);
        assert_eq!(outcome.watermark.last_file.as_deref(), Some("c.avro"));
        assert!(outcome.stats.stopped_early);
    }

    #[test]
    fn test_ceiling_floor_never_stops_in_first_two_files() {
        let store = store_with(&[("a.avro", 6), ("b.avro", 6)]);
        let outcome = ingest(&store, "", &limits(10), None).unwrap();

        assert_eq!(outcome.records.len(), 12);
        assert_eq!(outcome.stats.files_committed, 2);
        assert!(!outcome.stats.stopped_early);
    }

    #[test]
    fn test_malformed_batch_aborts_run() {
        let mut store = MemoryStore::new();
        store.insert_with_size("a.avro", b"corrupt container".to_vec(), 10_000);

        let err = ingest(&store, "", &IngestLimits::default(), None).unwrap_err();
        assert!(matches!(err, Error::MalformedBatch { ref name, .. } if name == "a.avro"));
    }

    #[test]
    fn test_archive_mirrors_committed_batches_only() {
        let mut store = MemoryStore::new();
        store.insert_with_size("a.avro", b"placeholder".to_vec(), 100);
        store.insert_with_size("b.avro", batch_bytes(2), 10_000);

        let archive = MemoryArchive::new();
        let outcome = ingest(&store, "", &IngestLimits::default(), Some(&archive)).unwrap();

        assert_eq!(archive.names(), ["b.avro"]);
        assert_eq!(archive.get("b.avro").unwrap(), store.read("b.avro").unwrap());
        assert_eq!(outcome.stats.files_skipped, 1);
    }

    #[test]
    fn test_resume_from_watermark_excludes_last_file() {
        let store = store_with(&[("a.avro", 1), ("b.avro", 1), ("c.avro", 1)]);

        let first = ingest(&store, "", &IngestLimits::default(), None).unwrap();
        assert_eq!(first.watermark.last_file.as_deref(), Some("c.avro"));

        let cursor = first.watermark.last_file.unwrap();
        let second = ingest(&store, &cursor, &IngestLimits::default(), None).unwrap();
        assert!(second.records.is_empty());
        assert_eq!(second.watermark, Watermark::default());
    }

    #[test]
    fn test_end_to_end_local_run() {
        use crate::sink::{LocalMetadata, MetadataSink};
        use crate::source::LocalStore;
        use crate::watermark::WATERMARK_KEY;
        use crate::{enrich, table};
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let capture = tmp.path().join("capture");

        // One real batch with the two canonical payloads, padded past the
        // placeholder threshold with filler events.
        let schema = Schema::parse_str(CAPTURE_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        let payloads = [
            json!({"percentage": "50", "timestamp": "1700000000", "url": "/la/author1/unit1"}),
            json!({"percentage": "", "timestamp": "1700000100", "url": "/la/"}),
            json!({"percentage": "10", "timestamp": "1699000000", "url": "ed12ad9791554f32b3327671030c0e5e", "padding": "x".repeat(600)}),
        ];
        for (seq, payload) in payloads.iter().enumerate() {
            let mut record = Record::new(writer.schema()).unwrap();
            record.put("SequenceNumber", seq as i64);
            record.put("Body", AvroValue::Bytes(payload.to_string().into_bytes()));
            writer.append(record).unwrap();
        }
        let name = "2023/06/01/00.avro";
        let path = capture.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, writer.into_inner().unwrap()).unwrap();

        let store = LocalStore::new(&capture);
        let outcome = ingest(&store, "", &IngestLimits::default(), None).unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.watermark.last_file.as_deref(), Some(name));

        let mut table = table::normalize(outcome.records).unwrap();
        enrich::add_unit_type(&mut table);

        // The blank-percentage row is gone; the survivors come out sorted.
        assert_eq!(table.len(), 2);
        let rows = table.rows();
        assert_eq!(rows[0].url, "ed12ad9791554f32b3327671030c0e5e");
        assert_eq!(rows[0].unit_type.as_deref(), Some("Evaluation"));
        assert_eq!(rows[1].percentage, 50.0);
        assert_eq!(rows[1].author, "author1");
        assert_eq!(rows[1].unit, "unit1");
        assert_eq!(rows[1].unit_type.as_deref(), Some("Content"));
        assert_eq!(
            rows[1].day,
            chrono::NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
        );

        // Persist the watermark; resuming from it finds nothing new.
        let metadata = LocalMetadata::new(tmp.path().join("metadata"));
        crate::watermark::emit(&metadata, WATERMARK_KEY, &outcome.watermark);
        let cursor = metadata
            .load(WATERMARK_KEY)
            .unwrap()
            .unwrap()
            .last_file
            .unwrap();
        let resumed = ingest(&store, &cursor, &IngestLimits::default(), None).unwrap();
        assert!(resumed.records.is_empty());
    }

    #[test]
    fn test_resume_mid_listing() {
        let store = store_with(&[("a.avro", 1), ("b.avro", 1), ("c.avro", 1)]);

        let outcome = ingest(&store, "a.avro", &IngestLimits::default(), None).unwrap();
        assert_eq!(outcome.watermark.first_file.as_deref(), Some("b.avro"));
        assert_eq!(outcome.watermark.last_file.as_deref(), Some("c.avro"));
        assert_eq!(outcome.records.len(), 2);
    }
}
