//! Golden envelope vectors.
//!
//! Byte-exact envelopes that any compatible producer must emit for the
//! listed inputs and any compatible consumer must accept. The vectors are
//! exported as JSON for implementations in other languages.

use serde::{Deserialize, Serialize};

/// One user record of a test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Partition key.
    pub partition_key: String,
    /// Explicit hash key, if any.
    pub explicit_hash_key: Option<String>,
    /// Payload (hex-encoded).
    pub data_hex: String,
}

impl VectorRecord {
    fn new(partition_key: &str, data: &[u8]) -> Self {
        Self {
            partition_key: partition_key.into(),
            explicit_hash_key: None,
            data_hex: hex_encode(data),
        }
    }

    fn with_explicit_hash_key(mut self, explicit_hash_key: &str) -> Self {
        self.explicit_hash_key = Some(explicit_hash_key.into());
        self
    }

    /// Decoded payload.
    pub fn data(&self) -> Vec<u8> {
        hex_decode(&self.data_hex)
    }
}

/// An envelope test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Records added to the aggregator, in order.
    pub records: Vec<VectorRecord>,
    /// Expected envelope bytes (hex-encoded).
    pub expected_hex: String,
}

impl EnvelopeVector {
    /// Expected envelope bytes.
    pub fn expected_bytes(&self) -> Vec<u8> {
        hex_decode(&self.expected_hex)
    }
}

/// Envelope of a body with no tables and no records.
pub const EMPTY_ENVELOPE_HEX: &str = "f3899ac2d41d8cd98f00b204e9800998ecf8427e";

/// Returns the standard envelope vectors.
#[must_use]
pub fn envelope_vectors() -> Vec<EnvelopeVector> {
    vec![
        EnvelopeVector {
            id: "single_record".into(),
            description: "One record, one partition key".into(),
            records: vec![VectorRecord::new("a", b"b")],
            expected_hex: "f3899ac20a01611a0508001a016275b9724261679483b6125c2a4c071f65".into(),
        },
        EnvelopeVector {
            id: "shared_partition_key".into(),
            description: "Repeated partition key is interned once".into(),
            records: vec![
                VectorRecord::new("user-1", b"one"),
                VectorRecord::new("user-2", b"two"),
                VectorRecord::new("user-1", b"three"),
            ],
            expected_hex: concat!(
                "f3899ac2",
                "0a06757365722d310a06757365722d32",
                "1a0708001a036f6e65",
                "1a0708011a0374776f",
                "1a0908001a057468726565",
                "4aee6547783235c7a244e86150d6f627",
            )
            .into(),
        },
        EnvelopeVector {
            id: "explicit_hash_key".into(),
            description: "Explicit hash key on one record, empty payload on another".into(),
            records: vec![
                VectorRecord::new("pk", b"x")
                    .with_explicit_hash_key("340282366920938463463374607431768211455"),
                VectorRecord::new("pk", b""),
            ],
            expected_hex: concat!(
                "f3899ac2",
                "0a02706b",
                "1227333430323832333636393230393338343633343633333734363037343331373638323131343535",
                "1a07080010001a0178",
                "1a0408001a00",
                "898b2bcd5bb4be78bc00230c64a41221",
            )
            .into(),
        },
    ]
}

/// Generate all envelope vectors as JSON for cross-language use.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        empty_envelope_hex: EMPTY_ENVELOPE_HEX.into(),
        envelopes: envelope_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    empty_envelope_hex: String,
    envelopes: Vec<EnvelopeVector>,
}

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
///
/// # Panics
///
/// Panics on invalid hex.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
