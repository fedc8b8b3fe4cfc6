//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding an aggregated envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload does not start with the aggregation magic.
    #[error("payload does not start with the aggregation magic")]
    MissingMagic,

    /// The payload carries the magic but is too short to hold a digest.
    #[error("aggregated payload truncated: {len} bytes is shorter than magic and digest")]
    Truncated {
        /// Length of the offending payload.
        len: usize,
    },

    /// The trailing digest does not match the body.
    #[error("checksum mismatch: expected {expected:032x}, got {actual:032x}")]
    ChecksumMismatch {
        /// Digest carried by the envelope.
        expected: u128,
        /// Digest computed over the body.
        actual: u128,
    },

    /// The protobuf body could not be decoded.
    #[error("decoding failed: {message}")]
    Decode {
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Create a decoding failed error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error is an integrity failure rather than a
    /// structural one.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

impl From<prost::DecodeError> for CodecError {
    fn from(err: prost::DecodeError) -> Self {
        Self::decode(err.to_string())
    }
}
