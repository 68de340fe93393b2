//! Record output.

use async_trait::async_trait;
use bw_error::WalkError;
use bw_traits::{RecordCallback, RecordResult};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// How records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One record per line
    Lines,
    /// A single JSON array, one element per record
    JsonArray,
    /// Nothing is written; records are only counted
    Discard,
}

struct SinkState<W> {
    out: W,
    written: u64,
    started: bool,
}

/// Callback writing delivered records to a writer.
///
/// Workers call it concurrently; writes are serialized so records never
/// interleave. Errors reported by the walker are logged and counted, and do
/// not stop the walk.
pub struct RecordSink<W: Write + Send> {
    mode: OutputMode,
    state: Mutex<SinkState<W>>,
    errors: AtomicU64,
}

impl<W: Write + Send> RecordSink<W> {
    /// Create a sink.
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            mode,
            state: Mutex::new(SinkState {
                out,
                written: 0,
                started: false,
            }),
            errors: AtomicU64::new(0),
        }
    }

    /// Write the opening of the output, if the mode has one.
    pub fn begin(&self) -> std::io::Result<()> {
        let mut state = self.state.lock();
        if state.started {
            return Ok(());
        }
        state.started = true;
        if self.mode == OutputMode::JsonArray {
            state.out.write_all(b"[")?;
        }
        Ok(())
    }

    /// Write the closing of the output and flush.
    pub fn finish(&self) -> std::io::Result<()> {
        let mut state = self.state.lock();
        if self.mode == OutputMode::JsonArray {
            if !state.started {
                state.out.write_all(b"[")?;
                state.started = true;
            }
            if state.written > 0 {
                state.out.write_all(b"\n")?;
            }
            state.out.write_all(b"]\n")?;
        }
        state.out.flush()
    }

    /// Number of records written (or counted when discarding).
    pub fn written(&self) -> u64 {
        self.state.lock().written
    }

    /// Number of errors reported by the walker.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    fn write_record(&self, body: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock();
        match self.mode {
            OutputMode::Discard => {}
            OutputMode::Lines => {
                state.out.write_all(body)?;
                state.out.write_all(b"\n")?;
            }
            OutputMode::JsonArray => {
                if !state.started {
                    state.out.write_all(b"[")?;
                    state.started = true;
                }
                let separator: &[u8] = if state.written == 0 { b"\n" } else { b",\n" };
                state.out.write_all(separator)?;
                state.out.write_all(body)?;
            }
        }
        state.written += 1;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> RecordCallback for RecordSink<W> {
    async fn on_record(&self, item: RecordResult) -> bw_error::Result<()> {
        match item {
            Ok(record) => self.write_record(record.body()).map_err(|e| {
                WalkError::Other(anyhow::Error::new(e).context("Failed to write record"))
            }),
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(object = e.object().unwrap_or("-"), error = %e, "Skipping");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_error::SourceError;
    use bw_types::WalkRecord;

    fn record(body: &str, index: u64) -> RecordResult {
        Ok(WalkRecord::new(body.to_string(), "a.jsonl", index))
    }

    async fn emit(mode: OutputMode, bodies: &[&str]) -> String {
        let sink = RecordSink::new(Vec::new(), mode);
        sink.begin().unwrap();
        for (i, body) in bodies.iter().enumerate() {
            sink.on_record(record(body, i as u64)).await.unwrap();
        }
        sink.finish().unwrap();

        assert_eq!(sink.errors(), 0);
        assert_eq!(sink.written(), bodies.len() as u64);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_lines() {
        let out = emit(OutputMode::Lines, &["{\"a\":1}", "{\"a\":2}"]).await;
        assert_eq!(out, "{\"a\":1}\n{\"a\":2}\n");
    }

    #[tokio::test]
    async fn test_json_array_parses() {
        let out = emit(OutputMode::JsonArray, &["{\"a\":1}", "{\"a\":2}"]).await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"a": 1}, {"a": 2}]));
    }

    #[tokio::test]
    async fn test_empty_json_array() {
        let out = emit(OutputMode::JsonArray, &[]).await;
        assert_eq!(out, "[]\n");
    }

    #[tokio::test]
    async fn test_discard_counts_only() {
        let out = emit(OutputMode::Discard, &["{}", "{}", "{}"]).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_counted_not_fatal() {
        let sink = RecordSink::new(Vec::new(), OutputMode::Lines);
        sink.on_record(Err(SourceError::NotFound("gone.jsonl".to_string()).into()))
            .await
            .unwrap();
        assert_eq!(sink.errors(), 1);
        assert_eq!(sink.written(), 0);
    }
}
