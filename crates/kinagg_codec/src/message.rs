//! Protobuf messages carried inside an aggregated envelope.
//!
//! The schema is the proto2 `AggregatedRecord` used by stream producers and
//! consumers that speak the aggregation format:
//!
//! ```text
//! message AggregatedRecord {
//!   repeated string partition_key_table     = 1;
//!   repeated string explicit_hash_key_table = 2;
//!   repeated Record records                 = 3;
//! }
//! message Tag    { required string key = 1; optional string value = 2; }
//! message Record {
//!   required uint64 partition_key_index     = 1;
//!   optional uint64 explicit_hash_key_index = 2;
//!   required bytes  data                    = 3;
//!   repeated Tag    tags                    = 4;
//! }
//! ```

use bytes::Bytes;

/// Field number of `AggregatedRecord.partition_key_table`.
pub const PARTITION_KEY_TABLE_TAG: u32 = 1;
/// Field number of `AggregatedRecord.explicit_hash_key_table`.
pub const EXPLICIT_HASH_KEY_TABLE_TAG: u32 = 2;
/// Field number of `AggregatedRecord.records`.
pub const RECORDS_TAG: u32 = 3;

/// Field number of `Record.partition_key_index`.
pub const PARTITION_KEY_INDEX_TAG: u32 = 1;
/// Field number of `Record.explicit_hash_key_index`.
pub const EXPLICIT_HASH_KEY_INDEX_TAG: u32 = 2;
/// Field number of `Record.data`.
pub const DATA_TAG: u32 = 3;

/// Body of an aggregated envelope.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AggregatedRecord {
    /// Interned partition keys, referenced by index.
    #[prost(string, repeated, tag = "1")]
    pub partition_key_table: Vec<String>,
    /// Interned explicit hash keys, referenced by index.
    #[prost(string, repeated, tag = "2")]
    pub explicit_hash_key_table: Vec<String>,
    /// Constituent records in packing order.
    #[prost(message, repeated, tag = "3")]
    pub records: Vec<Record>,
}

/// One constituent record.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Record {
    /// Index into `partition_key_table`.
    #[prost(uint64, required, tag = "1")]
    pub partition_key_index: u64,
    /// Index into `explicit_hash_key_table`, if the record has one.
    #[prost(uint64, optional, tag = "2")]
    pub explicit_hash_key_index: Option<u64>,
    /// User payload.
    #[prost(bytes = "bytes", required, tag = "3")]
    pub data: Bytes,
    /// Free-form tags. Written by some producers, ignored on expansion.
    #[prost(message, repeated, tag = "4")]
    pub tags: Vec<Tag>,
}

/// Key/value tag attached to a record.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tag {
    /// Tag key.
    #[prost(string, required, tag = "1")]
    pub key: String,
    /// Optional tag value.
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

impl AggregatedRecord {
    /// Looks up the partition key referenced by `record`.
    pub fn partition_key(&self, record: &Record) -> Option<&str> {
        usize::try_from(record.partition_key_index)
            .ok()
            .and_then(|i| self.partition_key_table.get(i))
            .map(String::as_str)
    }

    /// Looks up the explicit hash key referenced by `record`.
    ///
    /// Returns `Some(None)` when the record carries no index and `None` when
    /// the index points outside the table.
    pub fn explicit_hash_key(&self, record: &Record) -> Option<Option<&str>> {
        match record.explicit_hash_key_index {
            None => Some(None),
            Some(index) => usize::try_from(index)
                .ok()
                .and_then(|i| self.explicit_hash_key_table.get(i))
                .map(|k| Some(k.as_str())),
        }
    }
}
