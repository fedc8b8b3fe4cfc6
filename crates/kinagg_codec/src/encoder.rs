//! Envelope encoder and size accounting.

use crate::message::{
    AggregatedRecord, DATA_TAG, EXPLICIT_HASH_KEY_INDEX_TAG, PARTITION_KEY_INDEX_TAG, RECORDS_TAG,
};
use md5::{Digest, Md5};
use prost::encoding::{encoded_len_varint, key_len};
use prost::Message;

/// Magic bytes identifying an aggregated payload.
pub const MAGIC: [u8; 4] = [0xF3, 0x89, 0x9A, 0xC2];

/// Length of the trailing MD5 digest.
pub const DIGEST_LEN: usize = 16;

/// Bytes added around the protobuf body: magic prefix plus digest.
pub const ENVELOPE_OVERHEAD: usize = MAGIC.len() + DIGEST_LEN;

/// Encode an aggregated record into a complete envelope.
///
/// The output is `MAGIC || body || md5(body)`.
pub fn encode_envelope(body: &AggregatedRecord) -> Vec<u8> {
    let encoded = body.encode_to_vec();
    let mut buf = Vec::with_capacity(envelope_len(encoded.len()));
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&encoded);
    buf.extend_from_slice(&digest(&encoded));
    buf
}

/// Compute the MD5 digest of an envelope body.
pub fn digest(body: &[u8]) -> [u8; DIGEST_LEN] {
    Md5::digest(body).into()
}

/// Encoded length of a protobuf body, without magic and digest.
pub fn encoded_body_len(body: &AggregatedRecord) -> usize {
    body.encoded_len()
}

/// Total envelope length for a body of `body_len` bytes.
#[must_use]
pub const fn envelope_len(body_len: usize) -> usize {
    ENVELOPE_OVERHEAD + body_len
}

/// Encoded length of one string entry in a key table (field `tag`).
#[must_use]
pub fn table_entry_len(tag: u32, value_len: usize) -> usize {
    key_len(tag) + encoded_len_varint(value_len as u64) + value_len
}

/// Encoded length a record adds to the `records` field of the body,
/// including its field key and length prefix.
#[must_use]
pub fn record_entry_len(
    partition_key_index: u64,
    explicit_hash_key_index: Option<u64>,
    data_len: usize,
) -> usize {
    let mut inner = key_len(PARTITION_KEY_INDEX_TAG) + encoded_len_varint(partition_key_index);
    if let Some(index) = explicit_hash_key_index {
        inner += key_len(EXPLICIT_HASH_KEY_INDEX_TAG) + encoded_len_varint(index);
    }
    inner += key_len(DATA_TAG) + encoded_len_varint(data_len as u64) + data_len;

    key_len(RECORDS_TAG) + encoded_len_varint(inner as u64) + inner
}
