//! Aggregator and deaggregator configuration.

/// Maximum size of one physical record on the wire (1 MiB).
///
/// The partition key of the physical record counts towards this limit.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

/// Default maximum number of user records per envelope.
pub const MAX_RECORDS_PER_ENVELOPE: usize = u32::MAX as usize;

/// How the aggregated record's own partition key is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PartitionKeyPolicy {
    /// Use the partition key (and explicit hash key, if any) of the first
    /// record added after a flush.
    #[default]
    FirstRecord,
    /// Use a fixed key for every aggregated record.
    Fixed {
        /// Partition key of every aggregated record.
        partition_key: String,
        /// Explicit hash key of every aggregated record.
        explicit_hash_key: Option<String>,
    },
}

impl PartitionKeyPolicy {
    /// Creates a fixed policy without an explicit hash key.
    pub fn fixed(partition_key: impl Into<String>) -> Self {
        Self::Fixed {
            partition_key: partition_key.into(),
            explicit_hash_key: None,
        }
    }
}

/// Configuration for an [`Aggregator`](crate::Aggregator).
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum size of an aggregated record, partition key included.
    pub max_record_bytes: usize,

    /// Maximum number of user records per envelope.
    pub max_records: usize,

    /// Partition key selection for the aggregated record.
    pub partition_key_policy: PartitionKeyPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_record_bytes: MAX_RECORD_BYTES,
            max_records: MAX_RECORDS_PER_ENVELOPE,
            partition_key_policy: PartitionKeyPolicy::FirstRecord,
        }
    }
}

impl AggregatorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum aggregated record size.
    #[must_use]
    pub fn max_record_bytes(mut self, bytes: usize) -> Self {
        self.max_record_bytes = bytes;
        self
    }

    /// Sets the maximum number of user records per envelope.
    #[must_use]
    pub fn max_records(mut self, count: usize) -> Self {
        self.max_records = count;
        self
    }

    /// Sets the partition key policy.
    #[must_use]
    pub fn partition_key_policy(mut self, policy: PartitionKeyPolicy) -> Self {
        self.partition_key_policy = policy;
        self
    }
}

/// What the deaggregator does with a physical record it cannot unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole call with the error.
    #[default]
    FailFast,
    /// Drop the record, log it and list it in the report.
    Skip,
}

/// Configuration for a [`Deaggregator`](crate::Deaggregator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeaggregatorConfig {
    /// Whether to verify the envelope digest before unpacking.
    pub verify_checksums: bool,

    /// Handling of integrity failures and malformed envelopes.
    pub error_policy: ErrorPolicy,
}

impl Default for DeaggregatorConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            error_policy: ErrorPolicy::FailFast,
        }
    }
}

impl DeaggregatorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to verify envelope digests.
    #[must_use]
    pub const fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }

    /// Sets the error policy.
    #[must_use]
    pub const fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
