//! Record types exchanged with producers and consumers.

use crate::error::{AggError, AggResult};
use bytes::Bytes;
use std::time::SystemTime;

/// Maximum partition key length, in Unicode scalar values.
pub const MAX_PARTITION_KEY_LEN: usize = 256;

/// A producer-supplied record before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    /// Partition key.
    pub partition_key: String,
    /// Optional explicit hash key (decimal 128-bit integer).
    pub explicit_hash_key: Option<String>,
    /// Payload.
    pub data: Bytes,
}

impl LogicalRecord {
    /// Creates a record without an explicit hash key.
    pub fn new(partition_key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            partition_key: partition_key.into(),
            explicit_hash_key: None,
            data: data.into(),
        }
    }

    /// Sets the explicit hash key.
    #[must_use]
    pub fn with_explicit_hash_key(mut self, explicit_hash_key: impl Into<String>) -> Self {
        self.explicit_hash_key = Some(explicit_hash_key.into());
        self
    }
}

/// A transport-level record as received from the stream.
///
/// The payload is either plain user data or an aggregated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalRecord {
    /// Partition key of the physical record.
    pub partition_key: String,
    /// Explicit hash key of the physical record, if known.
    pub explicit_hash_key: Option<String>,
    /// Raw payload.
    pub data: Bytes,
    /// Sequence number assigned by the stream.
    pub sequence_number: Option<String>,
    /// Approximate time the stream accepted the record.
    pub approximate_arrival_timestamp: Option<SystemTime>,
}

impl PhysicalRecord {
    /// Creates a physical record with no stream metadata.
    pub fn new(partition_key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            partition_key: partition_key.into(),
            explicit_hash_key: None,
            data: data.into(),
            sequence_number: None,
            approximate_arrival_timestamp: None,
        }
    }

    /// Sets the sequence number.
    #[must_use]
    pub fn with_sequence_number(mut self, sequence_number: impl Into<String>) -> Self {
        self.sequence_number = Some(sequence_number.into());
        self
    }

    /// Sets the approximate arrival timestamp.
    #[must_use]
    pub fn with_arrival_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.approximate_arrival_timestamp = Some(timestamp);
        self
    }

    /// Sets the explicit hash key.
    #[must_use]
    pub fn with_explicit_hash_key(mut self, explicit_hash_key: impl Into<String>) -> Self {
        self.explicit_hash_key = Some(explicit_hash_key.into());
        self
    }
}

/// A record produced by deaggregation.
///
/// Either a pass-through of a plain physical record or one of the records
/// unpacked from an aggregated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Partition key of the user record.
    pub partition_key: String,
    /// Explicit hash key of the user record, if any.
    pub explicit_hash_key: Option<String>,
    /// Payload.
    pub data: Bytes,
    /// Sequence number of the originating physical record.
    pub sequence_number: Option<String>,
    /// Position within the originating envelope; 0 for pass-through records.
    pub sub_sequence_number: u64,
    /// Arrival timestamp of the originating physical record.
    pub approximate_arrival_timestamp: Option<SystemTime>,
    /// Whether this record was unpacked from an envelope.
    pub aggregated: bool,
}

impl UserRecord {
    pub(crate) fn passthrough(record: &PhysicalRecord) -> Self {
        Self {
            partition_key: record.partition_key.clone(),
            explicit_hash_key: record.explicit_hash_key.clone(),
            data: record.data.clone(),
            sequence_number: record.sequence_number.clone(),
            sub_sequence_number: 0,
            approximate_arrival_timestamp: record.approximate_arrival_timestamp,
            aggregated: false,
        }
    }

    /// Returns the `(partition_key, data)` pair.
    pub fn key_and_data(&self) -> (&str, &[u8]) {
        (&self.partition_key, &self.data)
    }
}

/// Checks that a partition key is non-empty and within the length limit.
///
/// # Errors
///
/// Returns [`AggError::InvalidPartitionKey`] otherwise.
pub fn validate_partition_key(partition_key: &str) -> AggResult<()> {
    if partition_key.is_empty() {
        return Err(AggError::invalid_partition_key("partition key is empty"));
    }
    let len = partition_key.chars().count();
    if len > MAX_PARTITION_KEY_LEN {
        return Err(AggError::invalid_partition_key(format!(
            "{len} characters exceeds maximum of {MAX_PARTITION_KEY_LEN}"
        )));
    }
    Ok(())
}

/// Checks that an explicit hash key is a decimal integer in `0..2^128`.
///
/// # Errors
///
/// Returns [`AggError::InvalidExplicitHashKey`] otherwise.
pub fn validate_explicit_hash_key(explicit_hash_key: &str) -> AggResult<()> {
    if explicit_hash_key.is_empty() || !explicit_hash_key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AggError::invalid_explicit_hash_key(format!(
            "{explicit_hash_key:?} is not a decimal integer"
        )));
    }
    explicit_hash_key.parse::<u128>().map_err(|_| {
        AggError::invalid_explicit_hash_key(format!("{explicit_hash_key} is larger than 2^128 - 1"))
    })?;
    Ok(())
}
