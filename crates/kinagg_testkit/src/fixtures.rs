//! Record fixtures.
//!
//! Every helper builds fresh data on each call so tests never share state.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use kinagg_core::{
    AggRecord, Aggregator, LogicalRecord, PhysicalRecord, RecordSink, SkippedRecord, UserRecord,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Installs a log subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`, defaulting to `debug`. Safe to call from every test.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Payload length used by [`random_records`].
pub const DEFAULT_PAYLOAD_LEN: usize = 20;

/// Returns a fresh UUID-shaped partition key.
pub fn random_partition_key() -> String {
    Uuid::new_v4().to_string()
}

/// Returns `len` random alphanumeric bytes.
pub fn random_payload(len: usize) -> Bytes {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .collect::<Vec<u8>>()
        .into()
}

/// Builds `count` records with unique UUID partition keys and random payloads.
pub fn random_records(count: usize) -> Vec<LogicalRecord> {
    (0..count)
        .map(|_| LogicalRecord::new(random_partition_key(), random_payload(DEFAULT_PAYLOAD_LEN)))
        .collect()
}

/// Wraps logical records as plain physical records with sequence numbers
/// `"1"`, `"2"`, ... and increasing arrival timestamps.
pub fn plain_physical_records(records: &[LogicalRecord]) -> Vec<PhysicalRecord> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut physical = PhysicalRecord::new(record.partition_key.clone(), record.data.clone())
                .with_sequence_number((i + 1).to_string())
                .with_arrival_timestamp(arrival_timestamp(i));
            if let Some(ehk) = &record.explicit_hash_key {
                physical = physical.with_explicit_hash_key(ehk.clone());
            }
            physical
        })
        .collect()
}

/// Deterministic arrival timestamp for the `i`-th physical record.
pub fn arrival_timestamp(i: usize) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + i as u64)
}

/// Packs all records into a single aggregate.
///
/// # Panics
///
/// Panics if the records are invalid, do not fit into one aggregate, or
/// if `records` is empty.
pub fn aggregate_all(records: &[LogicalRecord]) -> AggRecord {
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator
            .add_logical_record(record.clone())
            .expect("record should fit into one aggregate");
    }
    aggregator
        .clear_and_get()
        .expect("at least one record is required")
}

/// Packs all records into one aggregated physical record carrying
/// `sequence_number`.
pub fn aggregated_physical_record(
    records: &[LogicalRecord],
    sequence_number: &str,
) -> PhysicalRecord {
    aggregate_all(records)
        .to_physical_record()
        .with_sequence_number(sequence_number)
}

/// Expected `partition_key -> data` mapping for a set of records with
/// unique partition keys.
#[derive(Debug, Clone, Default)]
pub struct CheckSet {
    expected: HashMap<String, Bytes>,
}

impl CheckSet {
    /// Builds a check set from the records that went in.
    pub fn new(records: &[LogicalRecord]) -> Self {
        let expected = records
            .iter()
            .map(|r| (r.partition_key.clone(), r.data.clone()))
            .collect();
        Self { expected }
    }

    /// Asserts that every record in `records` is one of the expected records
    /// with an unchanged payload.
    ///
    /// # Panics
    ///
    /// Panics on an unknown partition key or a payload that differs from the
    /// expected one.
    pub fn verify(&self, records: &[UserRecord]) {
        for record in records {
            let expected = self
                .expected
                .get(&record.partition_key)
                .unwrap_or_else(|| panic!("unexpected partition key {}", record.partition_key));
            assert_eq!(
                expected, &record.data,
                "payload mismatch for partition key {}",
                record.partition_key
            );
        }
    }

    /// Like [`verify`](Self::verify), and also asserts that no expected
    /// record is missing.
    ///
    /// # Panics
    ///
    /// Panics on a count mismatch or any failure of `verify`.
    pub fn verify_all(&self, records: &[UserRecord]) {
        assert_eq!(
            records.len(),
            self.expected.len(),
            "record count does not match"
        );
        self.verify(records);
    }
}

/// Sink that only counts what it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingSink {
    /// User records received.
    pub records: usize,
    /// Batches received.
    pub batches: usize,
    /// Physical records rejected under the skip policy.
    pub rejected: usize,
}

impl RecordSink for CountingSink {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        self.batches += 1;
        self.records += batch.len();
    }

    fn reject(&mut self, _skipped: SkippedRecord) {
        self.rejected += 1;
    }
}
