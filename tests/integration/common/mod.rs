//! Common utilities for integration tests.
//!
//! Buckets are temporary local directories; objects are written as plain or
//! gzip-compressed JSONL.

use async_trait::async_trait;
use bw_traits::{RecordCallback, RecordResult};
use bw_types::WalkRecord;
use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary local bucket.
pub struct TestBucket {
    dir: TempDir,
}

impl TestBucket {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Bucket URI (`file://...`).
    pub fn uri(&self) -> String {
        format!("file://{}", self.path().display())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn object_path(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        path
    }

    /// Write an object verbatim.
    pub fn put_raw(&self, name: &str, body: &[u8]) {
        std::fs::write(self.object_path(name), body).unwrap();
    }

    /// Write one record per line.
    pub fn put(&self, name: &str, lines: &[&str]) {
        let mut body = lines.join("\n");
        body.push('\n');
        self.put_raw(name, body.as_bytes());
    }

    /// Write one record per line, gzip-compressed.
    pub fn put_gzip(&self, name: &str, lines: &[&str]) {
        let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
        for line in lines {
            encoder.write_all(line.as_bytes()).unwrap();
            encoder.write_all(b"\n").unwrap();
        }
        self.put_raw(name, &encoder.finish().unwrap());
    }
}

/// Generate `n` records tagged with their object.
pub fn generate_records(object: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!(r#"{{"object":"{object}","seq":{i}}}"#))
        .collect()
}

/// Callback collecting everything it is handed.
#[derive(Default)]
pub struct Collector {
    items: Mutex<Vec<RecordResult>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivered records, in delivery order.
    pub fn records(&self) -> Vec<WalkRecord> {
        self.items
            .lock()
            .iter()
            .filter_map(|item| item.as_ref().ok().cloned())
            .collect()
    }

    /// Delivered record bodies as strings.
    pub fn bodies(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|r| String::from_utf8_lossy(r.body()).into_owned())
            .collect()
    }

    /// Records of one object, in delivery order.
    pub fn bodies_of(&self, object: &str) -> Vec<String> {
        self.records()
            .iter()
            .filter(|r| r.source_object() == object)
            .map(|r| String::from_utf8_lossy(r.body()).into_owned())
            .collect()
    }

    /// Number of errors reported.
    pub fn error_count(&self) -> usize {
        self.items.lock().iter().filter(|item| item.is_err()).count()
    }

    /// Objects named by reported errors.
    pub fn error_objects(&self) -> Vec<String> {
        self.items
            .lock()
            .iter()
            .filter_map(|item| item.as_ref().err())
            .filter_map(|e| e.object().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl RecordCallback for Collector {
    async fn on_record(&self, item: RecordResult) -> bw_error::Result<()> {
        self.items.lock().push(item);
        Ok(())
    }
}
