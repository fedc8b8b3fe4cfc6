//! Error types for kinagg core.

use kinagg_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type AggResult<T> = Result<T, AggError>;

/// Errors that can occur while aggregating or deaggregating records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggError {
    /// Adding the record would push the envelope past the byte limit.
    #[error("size limit exceeded: {current} + {additional} bytes exceeds limit of {limit} bytes")]
    SizeLimitExceeded {
        /// Current size of the pending aggregate.
        current: usize,
        /// Bytes the rejected record would have added.
        additional: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Adding the record would exceed the per-envelope record count.
    #[error("record count limit of {limit} reached")]
    TooManyRecords {
        /// Configured limit.
        limit: usize,
    },

    /// Partition key is empty or too long.
    #[error("invalid partition key: {message}")]
    InvalidPartitionKey {
        /// Description of the problem.
        message: String,
    },

    /// Explicit hash key is not a decimal 128-bit unsigned integer.
    #[error("invalid explicit hash key: {message}")]
    InvalidExplicitHashKey {
        /// Description of the problem.
        message: String,
    },

    /// Digest of an aggregated record does not match its body.
    #[error(
        "integrity check failed for record {}: {source}",
        .sequence_number.as_deref().unwrap_or("<unsequenced>")
    )]
    IntegrityError {
        /// Sequence number of the physical record, if known.
        sequence_number: Option<String>,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// Payload carries the magic but cannot be unpacked.
    #[error(
        "malformed aggregated record {}: {message}",
        .sequence_number.as_deref().unwrap_or("<unsequenced>")
    )]
    MalformedEnvelope {
        /// Sequence number of the physical record, if known.
        sequence_number: Option<String>,
        /// Description of the problem.
        message: String,
    },
}

impl AggError {
    /// Creates an invalid partition key error.
    pub fn invalid_partition_key(message: impl Into<String>) -> Self {
        Self::InvalidPartitionKey {
            message: message.into(),
        }
    }

    /// Creates an invalid explicit hash key error.
    pub fn invalid_explicit_hash_key(message: impl Into<String>) -> Self {
        Self::InvalidExplicitHashKey {
            message: message.into(),
        }
    }

    /// Creates a malformed envelope error.
    pub fn malformed(sequence_number: Option<&str>, message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            sequence_number: sequence_number.map(str::to_owned),
            message: message.into(),
        }
    }

    /// Maps a codec failure on a physical record to the matching error kind.
    pub fn from_codec(sequence_number: Option<&str>, source: CodecError) -> Self {
        if source.is_integrity() {
            Self::IntegrityError {
                sequence_number: sequence_number.map(str::to_owned),
                source,
            }
        } else {
            Self::malformed(sequence_number, source.to_string())
        }
    }

    /// Returns true if the caller should flush the aggregator and retry.
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self,
            Self::SizeLimitExceeded { .. } | Self::TooManyRecords { .. }
        )
    }

    /// Returns true if this error rejects a single physical record during
    /// deaggregation.
    pub fn is_record_rejection(&self) -> bool {
        matches!(
            self,
            Self::IntegrityError { .. } | Self::MalformedEnvelope { .. }
        )
    }
}
