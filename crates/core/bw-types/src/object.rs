//! Objects discovered by a source listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object discovered in a bucket or directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object name relative to the source root (e.g. `2020/items-0001.jsonl`)
    pub name: String,

    /// Size of the object in bytes
    pub size_bytes: u64,

    /// Last modified timestamp (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    /// Create object info with just a name and size.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            last_modified: None,
        }
    }

    /// Set the last modified timestamp.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// The final path segment of the object name.
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(ObjectInfo::new("a/b/index.txt", 0).basename(), "index.txt");
        assert_eq!(ObjectInfo::new("items.jsonl", 0).basename(), "items.jsonl");
    }

    #[test]
    fn test_serialization_skips_missing_timestamp() {
        let json = serde_json::to_string(&ObjectInfo::new("a.jsonl", 10)).unwrap();
        assert!(json.contains("\"name\":\"a.jsonl\""));
        assert!(!json.contains("last_modified"));
    }
}
