//! Producer-side record aggregation.
//!
//! An [`Aggregator`] accumulates user records and packs them into a single
//! envelope on [`Aggregator::clear_and_get`]. Size accounting is incremental:
//! every `add_record` computes exactly how many bytes the record adds to the
//! encoded envelope, so the pending aggregate never exceeds the configured
//! limit and no trial encoding is needed.

use crate::config::{AggregatorConfig, PartitionKeyPolicy};
use crate::error::{AggError, AggResult};
use crate::types::{
    validate_explicit_hash_key, validate_partition_key, LogicalRecord, PhysicalRecord,
};
use bytes::Bytes;
use kinagg_codec::{
    encode_envelope, encoded_body_len, envelope_len, record_entry_len, table_entry_len,
    AggregatedRecord, Record, EXPLICIT_HASH_KEY_TABLE_TAG, PARTITION_KEY_TABLE_TAG,
};
use std::collections::HashMap;

/// Interned key table with stable indices.
#[derive(Debug, Default)]
struct KeyTable {
    keys: Vec<String>,
    index: HashMap<String, u64>,
}

impl KeyTable {
    /// Returns the index `key` has or would get, and whether it is new.
    fn lookup(&self, key: &str) -> (u64, bool) {
        match self.index.get(key) {
            Some(&i) => (i, false),
            None => (self.keys.len() as u64, true),
        }
    }

    fn insert(&mut self, key: &str) -> u64 {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.keys.len() as u64;
        self.keys.push(key.to_owned());
        self.index.insert(key.to_owned(), i);
        i
    }

    fn take(&mut self) -> Vec<String> {
        self.index.clear();
        std::mem::take(&mut self.keys)
    }
}

/// Accumulates user records into one aggregated record.
///
/// Not synchronized; wrap it in a mutex to share between threads.
#[derive(Debug)]
pub struct Aggregator {
    config: AggregatorConfig,
    partition_keys: KeyTable,
    explicit_hash_keys: KeyTable,
    records: Vec<Record>,
    /// Encoded length of the pending protobuf body.
    body_len: usize,
    /// Partition key and explicit hash key of the pending aggregate.
    aggregate_key: Option<(String, Option<String>)>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Creates an aggregator with the default configuration.
    pub fn new() -> Self {
        Self {
            config: AggregatorConfig::default(),
            partition_keys: KeyTable::default(),
            explicit_hash_keys: KeyTable::default(),
            records: Vec::new(),
            body_len: 0,
            aggregate_key: None,
        }
    }

    /// Creates an aggregator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a fixed partition key policy carries an invalid
    /// partition key or explicit hash key.
    pub fn with_config(config: AggregatorConfig) -> AggResult<Self> {
        if let PartitionKeyPolicy::Fixed {
            partition_key,
            explicit_hash_key,
        } = &config.partition_key_policy
        {
            validate_partition_key(partition_key)?;
            if let Some(key) = explicit_hash_key {
                validate_explicit_hash_key(key)?;
            }
        }
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Number of user records pending.
    pub fn num_user_records(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are pending.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size the pending aggregate would have on the wire, counting magic,
    /// body, digest and the aggregate partition key.
    pub fn size_bytes(&self) -> usize {
        let key_len = self
            .aggregate_key
            .as_ref()
            .map_or(0, |(partition_key, _)| partition_key.len());
        envelope_len(self.body_len) + key_len
    }

    /// Adds a user record to the pending aggregate.
    ///
    /// On error the aggregator is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`AggError::InvalidPartitionKey`] / [`AggError::InvalidExplicitHashKey`]
    ///   if the keys fail validation.
    /// - [`AggError::SizeLimitExceeded`] if the record would push the aggregate
    ///   past `max_record_bytes`.
    /// - [`AggError::TooManyRecords`] if `max_records` records are pending.
    ///
    /// For the size errors the caller should flush with
    /// [`clear_and_get`](Self::clear_and_get) and retry.
    pub fn add_record(
        &mut self,
        partition_key: &str,
        explicit_hash_key: Option<&str>,
        data: impl Into<Bytes>,
    ) -> AggResult<()> {
        validate_partition_key(partition_key)?;
        if let Some(key) = explicit_hash_key {
            validate_explicit_hash_key(key)?;
        }

        if self.records.len() >= self.config.max_records {
            return Err(AggError::TooManyRecords {
                limit: self.config.max_records,
            });
        }

        let data = data.into();
        let additional = self.additional_body_len(partition_key, explicit_hash_key, data.len());

        let current = self.size_bytes();
        let projected = envelope_len(self.body_len + additional)
            + self.projected_key_len(partition_key);
        if projected > self.config.max_record_bytes {
            return Err(AggError::SizeLimitExceeded {
                current,
                additional: projected - current,
                limit: self.config.max_record_bytes,
            });
        }

        let partition_key_index = self.partition_keys.insert(partition_key);
        let explicit_hash_key_index = explicit_hash_key.map(|k| self.explicit_hash_keys.insert(k));
        self.records.push(Record {
            partition_key_index,
            explicit_hash_key_index,
            data,
            tags: Vec::new(),
        });
        self.body_len += additional;

        if self.aggregate_key.is_none() {
            self.aggregate_key = Some(match &self.config.partition_key_policy {
                PartitionKeyPolicy::FirstRecord => (
                    partition_key.to_owned(),
                    explicit_hash_key.map(str::to_owned),
                ),
                PartitionKeyPolicy::Fixed {
                    partition_key,
                    explicit_hash_key,
                } => (partition_key.clone(), explicit_hash_key.clone()),
            });
        }

        Ok(())
    }

    /// Adds a [`LogicalRecord`]. See [`add_record`](Self::add_record).
    ///
    /// # Errors
    ///
    /// Same as [`add_record`](Self::add_record).
    pub fn add_logical_record(&mut self, record: LogicalRecord) -> AggResult<()> {
        self.add_record(
            &record.partition_key,
            record.explicit_hash_key.as_deref(),
            record.data,
        )
    }

    /// Packs all pending records into an [`AggRecord`] and resets the
    /// aggregator.
    ///
    /// Returns `None` if nothing is pending.
    pub fn clear_and_get(&mut self) -> Option<AggRecord> {
        let (partition_key, explicit_hash_key) = self.aggregate_key.take()?;

        let body = AggregatedRecord {
            partition_key_table: self.partition_keys.take(),
            explicit_hash_key_table: self.explicit_hash_keys.take(),
            records: std::mem::take(&mut self.records),
        };
        debug_assert_eq!(encoded_body_len(&body), self.body_len);
        self.body_len = 0;

        let record = AggRecord {
            partition_key,
            explicit_hash_key,
            body,
        };
        tracing::debug!(
            user_records = record.num_user_records(),
            size_bytes = record.size_bytes(),
            "flushed aggregated record"
        );
        Some(record)
    }

    /// Discards all pending records.
    pub fn clear(&mut self) {
        self.partition_keys.take();
        self.explicit_hash_keys.take();
        self.records.clear();
        self.body_len = 0;
        self.aggregate_key = None;
    }

    /// Aggregates a sequence of records, handing each full aggregate to
    /// `on_record` and flushing the remainder at the end.
    ///
    /// Pending records from earlier `add_record` calls are included in the
    /// first aggregate. Returns the number of aggregates emitted.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or [`AggError::SizeLimitExceeded`]
    /// for a record that does not fit even in an empty aggregate. Aggregates
    /// completed before the error have already been emitted.
    pub fn aggregate<I, F>(&mut self, records: I, mut on_record: F) -> AggResult<usize>
    where
        I: IntoIterator<Item = LogicalRecord>,
        F: FnMut(AggRecord),
    {
        let mut emitted = 0;
        for record in records {
            let LogicalRecord {
                partition_key,
                explicit_hash_key,
                data,
            } = record;

            match self.add_record(&partition_key, explicit_hash_key.as_deref(), data.clone()) {
                Ok(()) => continue,
                Err(err) if err.is_size_limit() && !self.is_empty() => {
                    if let Some(full) = self.clear_and_get() {
                        tracing::trace!(
                            user_records = full.num_user_records(),
                            "aggregate full, emitting"
                        );
                        on_record(full);
                        emitted += 1;
                    }
                    self.add_record(&partition_key, explicit_hash_key.as_deref(), data)?;
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(rest) = self.clear_and_get() {
            on_record(rest);
            emitted += 1;
        }
        Ok(emitted)
    }

    fn additional_body_len(
        &self,
        partition_key: &str,
        explicit_hash_key: Option<&str>,
        data_len: usize,
    ) -> usize {
        let mut additional = 0;

        let (partition_key_index, new_partition_key) = self.partition_keys.lookup(partition_key);
        if new_partition_key {
            additional += table_entry_len(PARTITION_KEY_TABLE_TAG, partition_key.len());
        }

        let explicit_hash_key_index = explicit_hash_key.map(|key| {
            let (index, new_key) = self.explicit_hash_keys.lookup(key);
            if new_key {
                additional += table_entry_len(EXPLICIT_HASH_KEY_TABLE_TAG, key.len());
            }
            index
        });

        additional + record_entry_len(partition_key_index, explicit_hash_key_index, data_len)
    }

    /// Length of the aggregate partition key once `partition_key` is added.
    fn projected_key_len(&self, partition_key: &str) -> usize {
        match (&self.aggregate_key, &self.config.partition_key_policy) {
            (Some((key, _)), _) => key.len(),
            (None, PartitionKeyPolicy::FirstRecord) => partition_key.len(),
            (None, PartitionKeyPolicy::Fixed { partition_key, .. }) => partition_key.len(),
        }
    }
}

/// An aggregated record ready to be written to the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AggRecord {
    partition_key: String,
    explicit_hash_key: Option<String>,
    body: AggregatedRecord,
}

impl AggRecord {
    /// Partition key to send the record with.
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Explicit hash key to send the record with, if any.
    pub fn explicit_hash_key(&self) -> Option<&str> {
        self.explicit_hash_key.as_deref()
    }

    /// Number of user records packed in this aggregate.
    pub fn num_user_records(&self) -> usize {
        self.body.records.len()
    }

    /// Wire size, counting the envelope and the partition key.
    pub fn size_bytes(&self) -> usize {
        envelope_len(encoded_body_len(&self.body)) + self.partition_key.len()
    }

    /// The protobuf body.
    pub fn body(&self) -> &AggregatedRecord {
        &self.body
    }

    /// Encodes the envelope: magic, body and digest.
    pub fn to_record_bytes(&self) -> Vec<u8> {
        encode_envelope(&self.body)
    }

    /// Wraps the envelope in a [`PhysicalRecord`] without stream metadata.
    pub fn to_physical_record(&self) -> PhysicalRecord {
        let mut record = PhysicalRecord::new(self.partition_key.clone(), self.to_record_bytes());
        record.explicit_hash_key = self.explicit_hash_key.clone();
        record
    }
}
