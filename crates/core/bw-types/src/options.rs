//! Per-walk decoding choices.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Compression applied to every object of a walk.
///
/// Chosen by configuration for the whole walk; object names are never
/// inspected to guess it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain JSONL
    #[default]
    None,
    /// Block-compressed bzip2
    Bzip2,
    /// Gzip
    Gzip,
    /// Zstandard
    Zstd,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Compression::None),
            "bzip2" | "bz2" => Ok(Compression::Bzip2),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(format!("Unknown compression '{other}'")),
        }
    }
}

/// Canonical layout used when re-formatting records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    /// Sorted keys, no insignificant whitespace
    #[default]
    Compact,
    /// Sorted keys, indented
    Pretty,
}

/// What to do with a record that fails validation or re-formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Hand the error to the callback, which decides whether to stop
    #[default]
    Report,
    /// Log and count the record, then continue without calling the callback
    Skip,
    /// Stop the walk with the record's error
    Abort,
}

impl FromStr for InvalidRecordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(InvalidRecordPolicy::Report),
            "skip" => Ok(InvalidRecordPolicy::Skip),
            "abort" => Ok(InvalidRecordPolicy::Abort),
            other => Err(format!("Unknown invalid-record policy '{other}'")),
        }
    }
}
