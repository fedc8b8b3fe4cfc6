//! Benchmark utilities.

use bytes::Bytes;
use kinagg_core::{Aggregator, LogicalRecord, PhysicalRecord};
use rand::Rng;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Bytes {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect::<Vec<u8>>().into()
}

/// Generate records spread over `keys` distinct partition keys.
pub fn generate_records(count: usize, keys: usize, payload_size: usize) -> Vec<LogicalRecord> {
    let keys = keys.max(1);
    (0..count)
        .map(|i| LogicalRecord::new(format!("partition-{}", i % keys), random_data(payload_size)))
        .collect()
}

/// Pack records into as many aggregated physical records as needed.
pub fn aggregated_batch(records: Vec<LogicalRecord>) -> Vec<PhysicalRecord> {
    let mut out = Vec::new();
    let mut aggregator = Aggregator::new();
    aggregator
        .aggregate(records, |aggregated| {
            let seq = out.len().to_string();
            out.push(aggregated.to_physical_record().with_sequence_number(seq));
        })
        .expect("benchmark records are valid");
    out
}
