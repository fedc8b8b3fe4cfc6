//! # kinagg Codec
//!
//! Wire format for aggregated stream records.
//!
//! An aggregated payload packs many user records into one physical record:
//!
//! ```text
//! +----------------+---------------------------+------------------+
//! | magic (4)      | AggregatedRecord protobuf | md5(body) (16)   |
//! | F3 89 9A C2    | key tables + records      |                  |
//! +----------------+---------------------------+------------------+
//! ```
//!
//! Partition keys and explicit hash keys are interned in tables once per
//! envelope; records reference them by index.
//!
//! ## Usage
//!
//! ```
//! use bytes::Bytes;
//! use kinagg_codec::{classify, encode_envelope, AggregatedRecord, Payload, Record};
//!
//! let body = AggregatedRecord {
//!     partition_key_table: vec!["user-1".to_string()],
//!     explicit_hash_key_table: vec![],
//!     records: vec![Record {
//!         partition_key_index: 0,
//!         explicit_hash_key_index: None,
//!         data: Bytes::from_static(b"hello"),
//!         tags: vec![],
//!     }],
//! };
//! let bytes = Bytes::from(encode_envelope(&body));
//!
//! let Payload::Aggregated(envelope) = classify(&bytes).unwrap() else {
//!     unreachable!()
//! };
//! envelope.verify().unwrap();
//! assert_eq!(envelope.decode().unwrap(), body);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod message;

pub use decoder::{classify, decode_envelope, has_magic, Envelope, Payload};
pub use encoder::{
    digest, encode_envelope, encoded_body_len, envelope_len, record_entry_len, table_entry_len,
    DIGEST_LEN, ENVELOPE_OVERHEAD, MAGIC,
};
pub use error::{CodecError, CodecResult};
pub use message::{
    AggregatedRecord, Record, Tag, EXPLICIT_HASH_KEY_TABLE_TAG, PARTITION_KEY_TABLE_TAG,
};
