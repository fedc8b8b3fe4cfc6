//! Fuzz testing harnesses.
//!
//! These targets can be driven by cargo-fuzz or any other fuzzer feeding
//! arbitrary bytes. Each one panics only when an invariant breaks.

use bytes::Bytes;
use kinagg_codec::{classify, digest, has_magic, Payload, MAGIC};
use kinagg_core::{AggError, Aggregator, Deaggregator, PhysicalRecord};

/// Fuzz target for payload classification.
///
/// Payloads without the magic prefix are always plain; payloads with it
/// are never plain.
pub fn fuzz_classify(data: &[u8]) {
    let bytes = Bytes::copy_from_slice(data);
    match classify(&bytes) {
        Ok(Payload::Plain) => assert!(!has_magic(data), "magic payload classified as plain"),
        Ok(Payload::Aggregated(_)) | Err(_) => {
            assert!(has_magic(data), "plain payload classified as aggregated")
        }
    }
}

/// Fuzz target for envelope bodies with a correct digest.
///
/// Arbitrary bodies either expand or are rejected as malformed; they never
/// fail the integrity check.
pub fn fuzz_envelope_body(body: &[u8]) {
    let mut data = MAGIC.to_vec();
    data.extend_from_slice(body);
    data.extend_from_slice(&digest(body));

    let record = PhysicalRecord::new("fuzz", data).with_sequence_number("1");
    match Deaggregator::new().deaggregate_record(&record) {
        Ok(records) => {
            for (i, r) in records.iter().enumerate() {
                assert!(r.aggregated);
                assert_eq!(r.sub_sequence_number, i as u64);
            }
        }
        Err(err) => assert!(
            matches!(err, AggError::MalformedEnvelope { .. }),
            "unexpected error: {err}"
        ),
    }
}

/// One step of an aggregator fuzz sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzOp {
    /// Add a record under partition key `k{key}`.
    Add {
        /// Partition key selector.
        key: u8,
        /// Payload.
        data: Vec<u8>,
    },
    /// Flush the pending aggregate.
    Flush,
}

impl FuzzOp {
    /// Parse operations from fuzzer input.
    pub fn parse_sequence(data: &[u8]) -> Vec<FuzzOp> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let op_type = data[offset];
            offset += 1;

            if op_type % 4 == 0 {
                ops.push(FuzzOp::Flush);
                continue;
            }

            let Some(&len) = data.get(offset) else {
                break;
            };
            offset += 1;
            let end = (offset + len as usize).min(data.len());
            ops.push(FuzzOp::Add {
                key: op_type % 8,
                data: data[offset..end].to_vec(),
            });
            offset = end;
        }

        ops
    }

    /// Runs operations against a fresh aggregator, checking every flushed
    /// aggregate against what was added.
    pub fn execute_sequence(ops: &[FuzzOp]) {
        let mut aggregator = Aggregator::new();
        let mut pending: Vec<(String, Vec<u8>)> = Vec::new();

        for op in ops {
            match op {
                FuzzOp::Add { key, data } => {
                    let key = format!("k{key}");
                    aggregator
                        .add_record(&key, None, data.clone())
                        .expect("small records always fit");
                    pending.push((key, data.clone()));
                }
                FuzzOp::Flush => flush(&mut aggregator, &mut pending),
            }
        }
        flush(&mut aggregator, &mut pending);
    }
}

fn flush(aggregator: &mut Aggregator, pending: &mut Vec<(String, Vec<u8>)>) {
    let estimate = aggregator.size_bytes();
    let Some(aggregated) = aggregator.clear_and_get() else {
        assert!(pending.is_empty());
        return;
    };
    let physical = aggregated.to_physical_record();
    assert_eq!(estimate, physical.data.len() + physical.partition_key.len());

    let records = Deaggregator::new()
        .deaggregate_record(&physical)
        .expect("aggregator output must expand");
    let got: Vec<(String, Vec<u8>)> = records
        .into_iter()
        .map(|r| (r.partition_key, r.data.to_vec()))
        .collect();
    assert_eq!(&got, pending);
    pending.clear();
}

/// Fuzz target for aggregator operation sequences.
pub fn fuzz_aggregator_operations(data: &[u8]) {
    FuzzOp::execute_sequence(&FuzzOp::parse_sequence(data));
}
