//! Consumer-side record deaggregation.
//!
//! Each physical record goes through the same steps:
//!
//! ```text
//! Unclassified ─┬─> Plain ──────────────────────────────> 1 user record
//!               └─> Aggregated ─> digest verified ─> Expanded: N user records
//!                        │               │
//!                        └───────────────┴─────────────> Rejected
//! ```
//!
//! Classification looks only at the magic prefix. A rejected record either
//! aborts the call or is skipped, depending on [`ErrorPolicy`]. Skipped
//! records are counted in the [`DeaggregationReport`] and handed to
//! [`RecordSink::reject`]; only [`Deaggregator::deaggregate`] keeps them.

use crate::config::{DeaggregatorConfig, ErrorPolicy};
use crate::error::{AggError, AggResult};
use crate::sink::RecordSink;
use crate::types::{PhysicalRecord, UserRecord};
use kinagg_codec::{classify, AggregatedRecord, Payload};
use std::borrow::Borrow;

/// Expands physical records into user records.
///
/// Holds no mutable state; a single instance can be shared between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deaggregator {
    config: DeaggregatorConfig,
}

/// A physical record the deaggregator dropped under [`ErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the input.
    pub index: usize,
    /// Sequence number of the record, if it had one.
    pub sequence_number: Option<String>,
    /// Why it was rejected.
    pub error: AggError,
}

/// Summary of one deaggregation call.
///
/// Plain counters, so its size does not depend on the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeaggregationReport {
    /// Physical records consumed.
    pub physical_records: usize,
    /// Physical records that carried an envelope and were expanded.
    pub aggregated_records: usize,
    /// User records delivered.
    pub user_records: usize,
    /// Physical records dropped.
    pub skipped: usize,
}

impl DeaggregationReport {
    /// Number of physical records dropped.
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    /// Returns true if nothing was dropped.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// Result of [`Deaggregator::deaggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deaggregated {
    /// User records in input order.
    pub records: Vec<UserRecord>,
    /// What happened along the way.
    pub report: DeaggregationReport,
    /// Records dropped under [`ErrorPolicy::Skip`], in input order.
    pub skipped: Vec<SkippedRecord>,
}

impl Deaggregated {
    /// Discards the report.
    pub fn into_records(self) -> Vec<UserRecord> {
        self.records
    }
}

impl Deaggregator {
    /// Creates a deaggregator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a deaggregator with the given configuration.
    pub fn with_config(config: DeaggregatorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DeaggregatorConfig {
        &self.config
    }

    /// Expands a single physical record.
    ///
    /// A plain record yields itself; an aggregated record yields its
    /// constituents in packing order. The error policy does not apply here.
    ///
    /// # Errors
    ///
    /// - [`AggError::IntegrityError`] if the digest does not match.
    /// - [`AggError::MalformedEnvelope`] if the envelope is truncated, the body
    ///   does not decode, or a key index is out of range.
    pub fn deaggregate_record(&self, record: &PhysicalRecord) -> AggResult<Vec<UserRecord>> {
        self.expand_record(record).map(|expansion| expansion.records)
    }

    fn expand_record(&self, record: &PhysicalRecord) -> AggResult<Expansion> {
        let sequence_number = record.sequence_number.as_deref();
        let payload =
            classify(&record.data).map_err(|e| AggError::from_codec(sequence_number, e))?;

        match payload {
            Payload::Plain => Ok(Expansion {
                records: vec![UserRecord::passthrough(record)],
                aggregated: false,
            }),
            Payload::Aggregated(envelope) => {
                if self.config.verify_checksums {
                    envelope
                        .verify()
                        .map_err(|e| AggError::from_codec(sequence_number, e))?;
                }
                let body = envelope
                    .decode()
                    .map_err(|e| AggError::from_codec(sequence_number, e))?;
                Ok(Expansion {
                    records: expand(record, &body)?,
                    aggregated: true,
                })
            }
        }
    }

    /// Expands a sequence of physical records into one list.
    ///
    /// Accepts owned records or references (`&[PhysicalRecord]`,
    /// `Vec<PhysicalRecord>`, a single-element array, ...). Records dropped
    /// under [`ErrorPolicy::Skip`] are kept in [`Deaggregated::skipped`].
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::FailFast`], the first rejected record aborts the
    /// call. Under [`ErrorPolicy::Skip`] this never fails.
    pub fn deaggregate<I>(&self, records: I) -> AggResult<Deaggregated>
    where
        I: IntoIterator,
        I::Item: Borrow<PhysicalRecord>,
    {
        let mut out = Collected::default();
        let report = self.stream(records, &mut out)?;
        Ok(Deaggregated {
            records: out.records,
            report,
            skipped: out.skipped,
        })
    }

    /// Expands a slice of physical records into `sink`.
    ///
    /// # Errors
    ///
    /// See [`deaggregate`](Self::deaggregate). Records delivered before a
    /// fail-fast error stay delivered.
    pub fn process_records<S: RecordSink>(
        &self,
        records: &[PhysicalRecord],
        sink: S,
    ) -> AggResult<DeaggregationReport> {
        self.stream(records, sink)
    }

    /// Expands a lazy, possibly unbounded sequence of physical records into
    /// `sink`.
    ///
    /// Only one physical record's expansion is held in memory at a time.
    /// Skipped records go to [`RecordSink::reject`] and are not retained.
    ///
    /// # Errors
    ///
    /// See [`deaggregate`](Self::deaggregate).
    pub fn stream<I, S>(&self, records: I, mut sink: S) -> AggResult<DeaggregationReport>
    where
        I: IntoIterator,
        I::Item: Borrow<PhysicalRecord>,
        S: RecordSink,
    {
        let mut report = DeaggregationReport::default();
        for (index, record) in records.into_iter().enumerate() {
            match self.route(index, record.borrow(), &mut report)? {
                Routed::Expanded(batch) if batch.is_empty() => {}
                Routed::Expanded(batch) => sink.accept(batch),
                Routed::Skipped(skipped) => sink.reject(skipped),
            }
        }
        Ok(report)
    }

    /// Returns a lazy iterator over the user records of `records`.
    ///
    /// After a fail-fast error the iterator yields the error once and ends.
    /// Under [`ErrorPolicy::Skip`] rejected records are logged and counted in
    /// [`UserRecords::report`].
    pub fn iter<I>(&self, records: I) -> UserRecords<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<PhysicalRecord>,
    {
        UserRecords {
            deaggregator: self,
            source: records.into_iter(),
            pending: Vec::new().into_iter(),
            report: DeaggregationReport::default(),
            index: 0,
            finished: false,
        }
    }

    /// Expands one record and applies the error policy.
    fn route(
        &self,
        index: usize,
        record: &PhysicalRecord,
        report: &mut DeaggregationReport,
    ) -> AggResult<Routed> {
        report.physical_records += 1;
        match self.expand_record(record) {
            Ok(Expansion { records, aggregated }) => {
                if aggregated {
                    report.aggregated_records += 1;
                }
                report.user_records += records.len();
                tracing::trace!(
                    index,
                    aggregated,
                    user_records = records.len(),
                    "deaggregated physical record"
                );
                Ok(Routed::Expanded(records))
            }
            Err(err) => match self.config.error_policy {
                ErrorPolicy::FailFast => Err(err),
                ErrorPolicy::Skip => {
                    tracing::warn!(
                        index,
                        sequence_number = record.sequence_number.as_deref().unwrap_or_default(),
                        error = %err,
                        "skipping physical record"
                    );
                    report.skipped += 1;
                    Ok(Routed::Skipped(SkippedRecord {
                        index,
                        sequence_number: record.sequence_number.clone(),
                        error: err,
                    }))
                }
            },
        }
    }
}

/// User records of one physical record and how they were obtained.
struct Expansion {
    records: Vec<UserRecord>,
    aggregated: bool,
}

/// Outcome of routing one physical record through the error policy.
enum Routed {
    Expanded(Vec<UserRecord>),
    Skipped(SkippedRecord),
}

/// Sink behind [`Deaggregator::deaggregate`].
#[derive(Default)]
struct Collected {
    records: Vec<UserRecord>,
    skipped: Vec<SkippedRecord>,
}

impl RecordSink for Collected {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        self.records.extend(batch);
    }

    fn reject(&mut self, skipped: SkippedRecord) {
        self.skipped.push(skipped);
    }
}

/// Turns a decoded body into user records carrying the physical record's
/// stream metadata.
fn expand(record: &PhysicalRecord, body: &AggregatedRecord) -> AggResult<Vec<UserRecord>> {
    let sequence_number = record.sequence_number.as_deref();
    body.records
        .iter()
        .enumerate()
        .map(|(i, inner)| {
            let partition_key = body.partition_key(inner).ok_or_else(|| {
                AggError::malformed(
                    sequence_number,
                    format!(
                        "record {i}: partition key index {} out of range ({} keys)",
                        inner.partition_key_index,
                        body.partition_key_table.len()
                    ),
                )
            })?;
            let explicit_hash_key = body.explicit_hash_key(inner).ok_or_else(|| {
                AggError::malformed(
                    sequence_number,
                    format!(
                        "record {i}: explicit hash key index {:?} out of range ({} keys)",
                        inner.explicit_hash_key_index,
                        body.explicit_hash_key_table.len()
                    ),
                )
            })?;

            Ok(UserRecord {
                partition_key: partition_key.to_owned(),
                explicit_hash_key: explicit_hash_key.map(str::to_owned),
                data: inner.data.clone(),
                sequence_number: record.sequence_number.clone(),
                sub_sequence_number: i as u64,
                approximate_arrival_timestamp: record.approximate_arrival_timestamp,
                aggregated: true,
            })
        })
        .collect()
}

/// Lazy iterator over deaggregated user records.
///
/// Created by [`Deaggregator::iter`]. Pulls one physical record from the
/// source only when the previous one's user records are exhausted.
///
/// # Example
///
/// ```
/// use kinagg_core::{Deaggregator, PhysicalRecord};
///
/// let source = (0..3u8).map(|i| PhysicalRecord::new(format!("key-{i}"), vec![i]));
/// let deaggregator = Deaggregator::new();
/// let keys: Vec<String> = deaggregator
///     .iter(source)
///     .map(|r| r.map(|r| r.partition_key))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(keys, ["key-0", "key-1", "key-2"]);
/// ```
pub struct UserRecords<'d, I> {
    deaggregator: &'d Deaggregator,
    source: I,
    pending: std::vec::IntoIter<UserRecord>,
    report: DeaggregationReport,
    index: usize,
    finished: bool,
}

impl<I> UserRecords<'_, I> {
    /// Running report for the records consumed so far.
    pub fn report(&self) -> &DeaggregationReport {
        &self.report
    }
}

impl<I> Iterator for UserRecords<'_, I>
where
    I: Iterator,
    I::Item: Borrow<PhysicalRecord>,
{
    type Item = AggResult<UserRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }

            let Some(physical) = self.source.next() else {
                self.finished = true;
                return None;
            };
            let index = self.index;
            self.index += 1;

            match self
                .deaggregator
                .route(index, physical.borrow(), &mut self.report)
            {
                Ok(Routed::Expanded(batch)) => self.pending = batch.into_iter(),
                Ok(Routed::Skipped(_)) => {}
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::sink::{ForEachBatch, ForEachRecord};
    use bytes::Bytes;
    use kinagg_codec::{digest, encode_envelope, Record, MAGIC};
    use std::time::{Duration, SystemTime};

    fn aggregated(keys: &[&str]) -> PhysicalRecord {
        let mut aggregator = Aggregator::new();
        for key in keys {
            aggregator
                .add_record(key, None, format!("data-{key}").into_bytes())
                .unwrap();
        }
        aggregator.clear_and_get().unwrap().to_physical_record()
    }

    fn corrupted(keys: &[&str]) -> PhysicalRecord {
        let mut record = aggregated(keys);
        let mut data = record.data.to_vec();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        record.data = Bytes::from(data);
        record
    }

    /// Envelope with a valid digest over a body that does not decode.
    fn malformed() -> PhysicalRecord {
        let body = [0xff, 0xff, 0xff];
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&body);
        data.extend_from_slice(&digest(&body));
        PhysicalRecord::new("pk", data)
    }

    fn skipping() -> Deaggregator {
        Deaggregator::with_config(DeaggregatorConfig::new().error_policy(ErrorPolicy::Skip))
    }

    fn keys(records: &[UserRecord]) -> Vec<&str> {
        records.iter().map(|r| r.partition_key.as_str()).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        let result = Deaggregator::new()
            .deaggregate(Vec::<PhysicalRecord>::new())
            .unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.report, DeaggregationReport::default());
    }

    #[test]
    fn plain_records_pass_through() {
        let records: Vec<_> = (0..4u8)
            .map(|i| {
                PhysicalRecord::new(format!("pk-{i}"), vec![i; 3]).with_sequence_number(i.to_string())
            })
            .collect();

        let result = Deaggregator::new().deaggregate(&records).unwrap();
        assert_eq!(keys(&result.records), ["pk-0", "pk-1", "pk-2", "pk-3"]);
        for (user, physical) in result.records.iter().zip(&records) {
            assert_eq!(user.data, physical.data);
            assert_eq!(user.sequence_number, physical.sequence_number);
            assert!(!user.aggregated);
        }
        assert_eq!(result.report.aggregated_records, 0);
    }

    #[test]
    fn aggregated_records_inherit_metadata() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let record = aggregated(&["a", "b", "c"])
            .with_sequence_number("900")
            .with_arrival_timestamp(at);

        let users = Deaggregator::new().deaggregate_record(&record).unwrap();
        assert_eq!(keys(&users), ["a", "b", "c"]);
        for (i, user) in users.iter().enumerate() {
            assert_eq!(user.sequence_number.as_deref(), Some("900"));
            assert_eq!(user.sub_sequence_number, i as u64);
            assert_eq!(user.approximate_arrival_timestamp, Some(at));
            assert!(user.aggregated);
        }
        assert_eq!(&users[1].data[..], b"data-b");
    }

    #[test]
    fn mixed_input_flattens_in_order() {
        let input = vec![
            PhysicalRecord::new("plain-1", &b"x"[..]),
            aggregated(&["a1", "a2"]),
            PhysicalRecord::new("plain-2", &b"y"[..]),
            aggregated(&["b1", "b2", "b3"]),
        ];

        let result = Deaggregator::new().deaggregate(&input).unwrap();
        assert_eq!(
            keys(&result.records),
            ["plain-1", "a1", "a2", "plain-2", "b1", "b2", "b3"]
        );
        assert_eq!(result.report.physical_records, 4);
        assert_eq!(result.report.aggregated_records, 2);
        assert_eq!(result.report.user_records, 7);
    }

    #[test]
    fn zero_record_envelope_yields_nothing() {
        let empty = PhysicalRecord::new("pk", encode_envelope(&AggregatedRecord::default()));
        let result = Deaggregator::new().deaggregate([empty]).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.report.aggregated_records, 1);
    }

    #[test]
    fn integrity_failure_fails_fast() {
        let input = vec![
            PhysicalRecord::new("ok", &b"x"[..]),
            corrupted(&["a"]).with_sequence_number("7"),
        ];
        let err = Deaggregator::new().deaggregate(&input).unwrap_err();
        match err {
            AggError::IntegrityError {
                sequence_number, ..
            } => assert_eq!(sequence_number.as_deref(), Some("7")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn integrity_failure_is_skipped_and_reported() {
        let deaggregator =
            Deaggregator::with_config(DeaggregatorConfig::new().error_policy(ErrorPolicy::Skip));
        let input = vec![
            aggregated(&["a1", "a2"]),
            corrupted(&["bad"]).with_sequence_number("2"),
            PhysicalRecord::new("plain", &b"x"[..]),
        ];

        let result = deaggregator.deaggregate(&input).unwrap();
        assert_eq!(keys(&result.records), ["a1", "a2", "plain"]);
        assert_eq!(result.report.skipped_count(), 1);
        assert!(!result.report.is_clean());

        assert_eq!(result.skipped.len(), 1);
        let skipped = &result.skipped[0];
        assert_eq!(skipped.index, 1);
        assert_eq!(skipped.sequence_number.as_deref(), Some("2"));
        assert!(matches!(skipped.error, AggError::IntegrityError { .. }));
    }

    #[test]
    fn malformed_envelope_is_skipped_and_reported() {
        let input = vec![
            PhysicalRecord::new("plain", &b"x"[..]),
            malformed().with_sequence_number("5"),
        ];

        let err = Deaggregator::new().deaggregate(&input).unwrap_err();
        assert!(matches!(err, AggError::MalformedEnvelope { .. }));

        let result = skipping().deaggregate(&input).unwrap();
        assert_eq!(keys(&result.records), ["plain"]);
        assert_eq!(result.report.skipped_count(), 1);
        assert_eq!(result.skipped[0].sequence_number.as_deref(), Some("5"));
        assert!(matches!(
            result.skipped[0].error,
            AggError::MalformedEnvelope { .. }
        ));
    }

    #[derive(Default)]
    struct Tally {
        records: usize,
        rejected: usize,
    }

    impl RecordSink for Tally {
        fn accept(&mut self, batch: Vec<UserRecord>) {
            self.records += batch.len();
        }

        fn reject(&mut self, _skipped: SkippedRecord) {
            self.rejected += 1;
        }
    }

    #[test]
    fn stream_counts_rejections_without_keeping_them() {
        fn plain_counters<T: Copy>(_: &T) {}

        let bad = corrupted(&["bad"]);
        let good = aggregated(&["x", "y"]);
        let source = (0..10_000).map(|i| if i % 100 == 0 { good.clone() } else { bad.clone() });

        let mut tally = Tally::default();
        let report = skipping().stream(source, &mut tally).unwrap();

        plain_counters(&report);
        assert_eq!(report.physical_records, 10_000);
        assert_eq!(report.skipped_count(), 9_900);
        assert_eq!(report.aggregated_records, 100);
        assert_eq!(tally.rejected, 9_900);
        assert_eq!(tally.records, 200);
    }

    #[test]
    fn iterator_skips_rejected_records() {
        let input = vec![
            PhysicalRecord::new("p1", &b"x"[..]),
            corrupted(&["bad"]),
            aggregated(&["a1", "a2"]),
            malformed(),
            PhysicalRecord::new("p2", &b"y"[..]),
        ];
        let deaggregator = skipping();
        let mut iter = deaggregator.iter(&input);

        let records: Vec<UserRecord> = iter.by_ref().collect::<AggResult<_>>().unwrap();
        assert_eq!(keys(&records), ["p1", "a1", "a2", "p2"]);

        let report = iter.report();
        assert_eq!(report.physical_records, 5);
        assert_eq!(report.skipped_count(), 2);
        assert_eq!(report.aggregated_records, 1);
        assert_eq!(report.user_records, 4);
    }

    #[test]
    fn unverified_envelope_still_counts_as_aggregated() {
        let deaggregator =
            Deaggregator::with_config(DeaggregatorConfig::new().verify_checksums(false));
        let report = deaggregator
            .process_records(&[corrupted(&["a"])], Vec::<UserRecord>::new())
            .unwrap();
        assert_eq!(report.aggregated_records, 1);
        assert_eq!(report.user_records, 1);
    }

    #[test]
    fn checksum_verification_can_be_disabled() {
        let deaggregator =
            Deaggregator::with_config(DeaggregatorConfig::new().verify_checksums(false));
        let users = deaggregator.deaggregate_record(&corrupted(&["a", "b"])).unwrap();
        assert_eq!(keys(&users), ["a", "b"]);
    }

    #[test]
    fn truncated_envelope_is_malformed_not_plain() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(b"short");
        let record = PhysicalRecord::new("pk", data);

        let err = Deaggregator::new().deaggregate_record(&record).unwrap_err();
        assert!(matches!(err, AggError::MalformedEnvelope { .. }));
    }

    #[test]
    fn out_of_range_key_index_is_malformed() {
        let body = AggregatedRecord {
            partition_key_table: vec!["only".into()],
            explicit_hash_key_table: vec![],
            records: vec![Record {
                partition_key_index: 1,
                explicit_hash_key_index: None,
                data: Bytes::from_static(b"x"),
                tags: vec![],
            }],
        };
        let record = PhysicalRecord::new("pk", encode_envelope(&body));

        let err = Deaggregator::new().deaggregate_record(&record).unwrap_err();
        assert!(err.to_string().contains("partition key index 1 out of range"));
    }

    #[test]
    fn explicit_hash_keys_survive() {
        let mut aggregator = Aggregator::new();
        aggregator.add_record("a", Some("100"), &b"1"[..]).unwrap();
        aggregator.add_record("b", None, &b"2"[..]).unwrap();
        let record = aggregator.clear_and_get().unwrap().to_physical_record();

        let users = Deaggregator::new().deaggregate_record(&record).unwrap();
        assert_eq!(users[0].explicit_hash_key.as_deref(), Some("100"));
        assert_eq!(users[1].explicit_hash_key, None);
    }

    #[test]
    fn sinks_receive_per_record_and_per_batch() {
        let input = vec![aggregated(&["a", "b"]), PhysicalRecord::new("p", &b"x"[..])];
        let deaggregator = Deaggregator::new();

        let mut count = 0;
        let report = deaggregator
            .process_records(&input, ForEachRecord(|_: UserRecord| count += 1))
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(report.user_records, 3);

        let mut batches = Vec::new();
        deaggregator
            .process_records(&input, ForEachBatch(|b: Vec<UserRecord>| batches.push(b.len())))
            .unwrap();
        assert_eq!(batches, vec![2, 1]);
    }

    #[test]
    fn stream_consumes_lazily() {
        let deaggregator = Deaggregator::new();
        let source = std::iter::repeat_with(|| aggregated(&["x", "y"])).take(1000);

        let mut seen = 0;
        let report = deaggregator
            .stream(source, ForEachRecord(|_: UserRecord| seen += 1))
            .unwrap();
        assert_eq!(seen, 2000);
        assert_eq!(report.physical_records, 1000);
    }

    #[test]
    fn iterator_pulls_one_physical_record_at_a_time() {
        let deaggregator = Deaggregator::new();
        let pulled = std::cell::Cell::new(0);
        let source = std::iter::repeat_with(|| {
            pulled.set(pulled.get() + 1);
            aggregated(&["x", "y", "z"])
        });

        let mut iter = deaggregator.iter(source);
        let first: Vec<_> = iter.by_ref().take(4).collect::<AggResult<_>>().unwrap();
        assert_eq!(keys(&first), ["x", "y", "z", "x"]);
        assert_eq!(pulled.get(), 2);
        assert_eq!(iter.report().user_records, 6);
    }

    #[test]
    fn iterator_stops_after_error() {
        let input = vec![
            corrupted(&["a"]),
            PhysicalRecord::new("never", &b"x"[..]),
        ];
        let deaggregator = Deaggregator::new();
        let mut iter = deaggregator.iter(&input);
        assert!(matches!(iter.next(), Some(Err(AggError::IntegrityError { .. }))));
        assert!(iter.next().is_none());
    }
}
