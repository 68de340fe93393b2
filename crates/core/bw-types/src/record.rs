//! Record type handed from the decoder to the query filter and callback.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single JSON record read from an object.
///
/// The body is an immutable, cheaply cloneable byte buffer holding exactly
/// one JSON value with surrounding whitespace removed. Records are never
/// mutated after the decoder creates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkRecord {
    /// Raw record bytes
    #[serde(with = "body_serde")]
    body: Bytes,

    /// Name of the object the record was read from
    source_object: String,

    /// Zero-based position of the record within its object
    index: u64,
}

impl WalkRecord {
    /// Create a new record.
    pub fn new(body: impl Into<Bytes>, source_object: impl Into<String>, index: u64) -> Self {
        Self {
            body: body.into(),
            source_object: source_object.into(),
            index,
        }
    }

    /// Get the record body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the originating object name.
    pub fn source_object(&self) -> &str {
        &self.source_object
    }

    /// Get the record's position within its object.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Get the body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

mod body_serde {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Bytes::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = WalkRecord::new(r#"{"id":1}"#, "2020/items.jsonl", 4);

        assert_eq!(record.body().as_ref(), br#"{"id":1}"#);
        assert_eq!(record.source_object(), "2020/items.jsonl");
        assert_eq!(record.index(), 4);
        assert_eq!(record.len(), 8);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_record_clone_shares_body() {
        let record = WalkRecord::new(vec![b'1'; 1024], "a.jsonl", 0);
        let copy = record.clone();
        assert_eq!(record.body().as_ptr(), copy.body().as_ptr());
    }
}
