//! Property-based test generators using proptest.
//!
//! Strategies produce records that pass validation, so generated inputs
//! exercise packing and unpacking rather than rejection paths.

use bytes::Bytes;
use kinagg_core::{LogicalRecord, PhysicalRecord, MAX_PARTITION_KEY_LEN};
use proptest::prelude::*;

/// Strategy for valid partition keys, including non-ASCII ones.
pub fn partition_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-z0-9-]{1,16}").expect("Invalid regex"),
        prop::string::string_regex("\\PC{1,8}").expect("Invalid regex"),
    ]
    .prop_filter("partition key must fit", |k| {
        !k.is_empty() && k.chars().count() <= MAX_PARTITION_KEY_LEN
    })
}

/// Strategy for valid explicit hash keys: decimal 128-bit integers.
pub fn explicit_hash_key_strategy() -> impl Strategy<Value = String> {
    any::<u128>().prop_map(|n| n.to_string())
}

/// Strategy for record payloads, empty payloads included.
pub fn payload_strategy() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..256).prop_map(Bytes::from)
}

/// Strategy for a single logical record.
pub fn logical_record_strategy() -> impl Strategy<Value = LogicalRecord> {
    (
        partition_key_strategy(),
        prop::option::of(explicit_hash_key_strategy()),
        payload_strategy(),
    )
        .prop_map(|(partition_key, explicit_hash_key, data)| LogicalRecord {
            partition_key,
            explicit_hash_key,
            data,
        })
}

/// Strategy for a batch of logical records drawing keys from a small pool,
/// so tables see both fresh and repeated keys.
pub fn record_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<LogicalRecord>> {
    (
        prop::collection::vec(partition_key_strategy(), 1..4),
        prop::collection::vec(explicit_hash_key_strategy(), 1..3),
    )
        .prop_flat_map(move |(keys, hash_keys)| {
            let record = (
                prop::sample::select(keys),
                prop::option::of(prop::sample::select(hash_keys)),
                payload_strategy(),
            )
                .prop_map(|(partition_key, explicit_hash_key, data)| LogicalRecord {
                    partition_key,
                    explicit_hash_key,
                    data,
                });
            prop::collection::vec(record, 1..=max_len.max(1))
        })
}

/// Strategy for payloads that do not start with the envelope magic.
pub fn plain_payload_strategy() -> impl Strategy<Value = Bytes> {
    payload_strategy().prop_filter("must not look aggregated", |data| {
        !kinagg_codec::has_magic(data)
    })
}

/// Strategy for a plain physical record with a sequence number.
pub fn plain_physical_record_strategy() -> impl Strategy<Value = PhysicalRecord> {
    (partition_key_strategy(), plain_payload_strategy(), any::<u32>()).prop_map(
        |(partition_key, data, seq)| {
            PhysicalRecord::new(partition_key, data).with_sequence_number(seq.to_string())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinagg_core::{Aggregator, Deaggregator, UserRecord};

    fn pack(records: &[LogicalRecord], sequence_number: &str) -> PhysicalRecord {
        let mut aggregator = Aggregator::new();
        for record in records {
            aggregator.add_logical_record(record.clone()).unwrap();
        }
        aggregator
            .clear_and_get()
            .unwrap()
            .to_physical_record()
            .with_sequence_number(sequence_number)
    }

    fn logical(record: &UserRecord) -> LogicalRecord {
        LogicalRecord {
            partition_key: record.partition_key.clone(),
            explicit_hash_key: record.explicit_hash_key.clone(),
            data: record.data.clone(),
        }
    }

    proptest! {
        #[test]
        fn aggregate_then_deaggregate_preserves_records(records in record_batch_strategy(32)) {
            let physical = pack(&records, "7");
            let out = Deaggregator::new().deaggregate([physical]).unwrap().into_records();

            prop_assert_eq!(out.len(), records.len());
            for (i, (got, want)) in out.iter().zip(&records).enumerate() {
                prop_assert_eq!(&logical(got), want);
                prop_assert_eq!(got.sub_sequence_number, i as u64);
                prop_assert_eq!(got.sequence_number.as_deref(), Some("7"));
                prop_assert!(got.aggregated);
            }
        }

        #[test]
        fn size_estimate_matches_wire_length(records in record_batch_strategy(32)) {
            let mut aggregator = Aggregator::new();
            for record in &records {
                aggregator.add_logical_record(record.clone()).unwrap();
            }
            let estimate = aggregator.size_bytes();
            let aggregated = aggregator.clear_and_get().unwrap();
            let wire = aggregated.to_record_bytes();

            prop_assert_eq!(estimate, aggregated.size_bytes());
            prop_assert_eq!(estimate, wire.len() + aggregated.partition_key().len());
        }

        #[test]
        fn plain_records_pass_through(records in prop::collection::vec(plain_physical_record_strategy(), 0..16)) {
            let out = Deaggregator::new().deaggregate(&records).unwrap().into_records();

            prop_assert_eq!(out.len(), records.len());
            for (got, want) in out.iter().zip(&records) {
                prop_assert_eq!(&got.partition_key, &want.partition_key);
                prop_assert_eq!(&got.data, &want.data);
                prop_assert_eq!(&got.sequence_number, &want.sequence_number);
                prop_assert_eq!(got.sub_sequence_number, 0);
                prop_assert!(!got.aggregated);
            }
        }

        #[test]
        fn mixed_input_keeps_order(
            plain in plain_physical_record_strategy(),
            batch in record_batch_strategy(8),
        ) {
            let input = vec![plain.clone(), pack(&batch, "2"), plain.clone()];
            let out = Deaggregator::new().deaggregate(&input).unwrap().into_records();

            prop_assert_eq!(out.len(), batch.len() + 2);
            prop_assert_eq!(&out[0].data, &plain.data);
            prop_assert_eq!(&out[out.len() - 1].data, &plain.data);
            for (got, want) in out[1..=batch.len()].iter().zip(&batch) {
                prop_assert_eq!(&logical(got), want);
            }
        }

        #[test]
        fn arbitrary_envelope_bodies_never_panic(body in prop::collection::vec(any::<u8>(), 0..128)) {
            let mut data = kinagg_codec::MAGIC.to_vec();
            data.extend_from_slice(&body);
            let record = PhysicalRecord::new("pk", data);

            // Either unpacks or reports an error; never treated as plain.
            if let Ok(out) = Deaggregator::new().deaggregate_record(&record) {
                prop_assert!(out.iter().all(|r| r.aggregated));
            }
        }
    }
}
