//! # kinagg Core
//!
//! Packs many user records into one physical stream record and unpacks them
//! again.
//!
//! This crate provides:
//! - [`Aggregator`] for producers: accumulate records, flush one envelope
//! - [`Deaggregator`] for consumers: expand envelopes, pass plain records through
//! - [`RecordSink`] implementations for per-record, per-batch or collected delivery
//!
//! ## Usage
//!
//! ```
//! use kinagg_core::{Aggregator, Deaggregator};
//!
//! let mut aggregator = Aggregator::new();
//! aggregator.add_record("user-1", None, &b"first"[..]).unwrap();
//! aggregator.add_record("user-2", None, &b"second"[..]).unwrap();
//!
//! let aggregated = aggregator.clear_and_get().unwrap();
//! assert_eq!(aggregated.num_user_records(), 2);
//!
//! let physical = aggregated.to_physical_record().with_sequence_number("1");
//! let records = Deaggregator::new().deaggregate([physical]).unwrap().into_records();
//! assert_eq!(records[1].partition_key, "user-2");
//! assert_eq!(&records[1].data[..], b"second");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod config;
mod deaggregator;
mod error;
mod sink;
mod types;

pub use aggregator::{AggRecord, Aggregator};
pub use config::{
    AggregatorConfig, DeaggregatorConfig, ErrorPolicy, PartitionKeyPolicy,
    MAX_RECORDS_PER_ENVELOPE, MAX_RECORD_BYTES,
};
pub use deaggregator::{
    Deaggregated, DeaggregationReport, Deaggregator, SkippedRecord, UserRecords,
};
pub use error::{AggError, AggResult};
pub use sink::{ForEachBatch, ForEachRecord, RecordSink};
pub use types::{
    validate_explicit_hash_key, validate_partition_key, LogicalRecord, PhysicalRecord, UserRecord,
    MAX_PARTITION_KEY_LEN,
};

/// Re-export of the wire format crate.
pub use kinagg_codec as codec;
