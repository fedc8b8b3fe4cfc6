//! Envelope classification and decoding.

use crate::encoder::{digest, DIGEST_LEN, ENVELOPE_OVERHEAD, MAGIC};
use crate::error::{CodecError, CodecResult};
use crate::message::AggregatedRecord;
use bytes::Bytes;
use prost::Message;

/// Classification of a physical record payload.
///
/// Produced once per payload by [`classify`]. Detection is strictly
/// magic-prefix based: a payload that does not start with [`MAGIC`] is
/// always [`Payload::Plain`], whatever it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Not aggregated; the whole payload is one user record.
    Plain,
    /// Starts with the aggregation magic.
    Aggregated(Envelope),
}

/// An aggregated envelope split into body and trailing digest.
///
/// Both parts share the buffer of the original payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    body: Bytes,
    digest: [u8; DIGEST_LEN],
}

/// Classify a payload as plain or aggregated.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the payload starts with the magic
/// but is too short to contain a digest. Such payloads are never treated
/// as plain data.
pub fn classify(data: &Bytes) -> CodecResult<Payload> {
    if !data.starts_with(&MAGIC) {
        return Ok(Payload::Plain);
    }
    Envelope::split(data).map(Payload::Aggregated)
}

/// Returns true if `data` carries the aggregation magic prefix.
pub fn has_magic(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}

/// Verify and decode an envelope in one step.
///
/// # Errors
///
/// Returns an error if the magic is missing, the payload is truncated,
/// the digest does not match, or the body is not a valid `AggregatedRecord`.
pub fn decode_envelope(data: &Bytes) -> CodecResult<AggregatedRecord> {
    if !has_magic(data) {
        return Err(CodecError::MissingMagic);
    }
    let envelope = Envelope::split(data)?;
    envelope.verify()?;
    envelope.decode()
}

impl Envelope {
    fn split(data: &Bytes) -> CodecResult<Self> {
        if data.len() < ENVELOPE_OVERHEAD {
            return Err(CodecError::Truncated { len: data.len() });
        }
        let digest_start = data.len() - DIGEST_LEN;
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&data[digest_start..]);
        Ok(Self {
            body: data.slice(MAGIC.len()..digest_start),
            digest,
        })
    }

    /// The protobuf body between magic and digest.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The digest carried at the end of the envelope.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Check the carried digest against the body.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ChecksumMismatch`] on mismatch.
    pub fn verify(&self) -> CodecResult<()> {
        let actual = digest(&self.body);
        if actual != self.digest {
            return Err(CodecError::ChecksumMismatch {
                expected: u128::from_be_bytes(self.digest),
                actual: u128::from_be_bytes(actual),
            });
        }
        Ok(())
    }

    /// Decode the protobuf body without checking the digest.
    ///
    /// Record payloads are sliced out of the envelope buffer rather than copied.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the body is not a valid message.
    pub fn decode(&self) -> CodecResult<AggregatedRecord> {
        AggregatedRecord::decode(self.body.clone()).map_err(Into::into)
    }
}
