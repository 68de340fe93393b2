//! Walk coordinator.
//!
//! One dispatcher lists the source and feeds accepted object names into a
//! FIFO queue; a fixed pool of workers drains it, each reading one object to
//! the end before taking the next. A walk-scoped cancellation token, derived
//! from the caller's, is checked before every object and between records.

use crate::config::WalkOptions;
use crate::stats::{StatsSnapshot, WalkStats};
use bw_error::{ErrorScope, Result, WalkError, WalkStage, classify_error};
use bw_query::QuerySet;
use bw_reader_jsonl::{Decoded, DecoderConfig, JsonlDecoder};
use bw_source::{SourceConfig, open_source};
use bw_traits::{ObjectFilter, ObjectSource, RecordCallback, RecordResult};
use bw_types::{InvalidRecordPolicy, ObjectInfo, WalkRecord};
use futures::StreamExt;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Shared work queue; workers take turns receiving from it.
type WorkQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ObjectInfo>>>;

/// A prefix to walk inside an opened source, and the URI it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkTarget {
    /// URI used in logs and errors
    pub uri: String,

    /// Prefix relative to the source root
    pub prefix: String,
}

impl WalkTarget {
    /// Create a target.
    pub fn new(uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: prefix.into(),
        }
    }

    /// A target for `sub` below a base URI whose prefix is `base_prefix`.
    pub fn under(base_uri: &str, base_prefix: &str, sub: &str) -> Self {
        Self {
            uri: join_path(base_uri, sub),
            prefix: join_path(base_prefix, sub),
        }
    }
}

fn join_path(base: &str, rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        return base.to_string();
    }
    if base.is_empty() || base.ends_with("://") {
        return format!("{base}{rest}");
    }
    format!("{}/{}", base.trim_end_matches('/'), rest)
}

/// Whether a worker keeps reading the current object.
enum Flow {
    Continue,
    Stop,
}

/// The first fatal error of a walk.
struct Failure {
    error: WalkError,
    object: Option<String>,
}

/// State shared by the dispatcher and every worker of one walk.
struct WalkShared {
    uri: String,
    source: Arc<dyn ObjectSource>,
    callback: Arc<dyn RecordCallback>,
    query_set: Option<QuerySet>,
    decoder: DecoderConfig,
    invalid_records: InvalidRecordPolicy,
    stats: WalkStats,
    cancel: CancellationToken,
    failure: Mutex<Option<Failure>>,
}

impl WalkShared {
    /// Record a fatal error and stop the walk. Only the first error is kept.
    fn fail(&self, error: WalkError, object: Option<&str>) {
        {
            let mut slot = self.failure.lock();
            if slot.is_none() {
                error!(
                    uri = %self.uri,
                    object = object.unwrap_or("-"),
                    error = %error,
                    "Walk failed"
                );
                *slot = Some(Failure {
                    error,
                    object: object.map(str::to_string),
                });
            } else {
                debug!(error = %error, "Ignoring error after walk already failed");
            }
        }
        self.cancel.cancel();
    }

    async fn deliver(&self, item: RecordResult, object: &str) -> Flow {
        let is_record = item.is_ok();
        match self.callback.on_record(item).await {
            Ok(()) => {
                if is_record {
                    self.stats.record_delivered();
                }
                Flow::Continue
            }
            Err(e) => {
                self.fail(e, Some(object));
                Flow::Stop
            }
        }
    }

    async fn report_object_error(&self, error: WalkError, object: &str, stage: WalkStage) -> Flow {
        self.stats.record_object_failure();
        if classify_error(&error, stage) == ErrorScope::Walk {
            self.fail(error, Some(object));
            return Flow::Stop;
        }
        warn!(object = %object, stage = %stage, error = %error, "Object failed");
        self.deliver(Err(error), object).await
    }

    async fn report_invalid(&self, error: WalkError, object: &str) -> Flow {
        match self.invalid_records {
            InvalidRecordPolicy::Report => {
                self.stats.record_invalid();
                debug!(object = %object, error = %error, "Reporting invalid record");
                self.deliver(Err(error), object).await
            }
            InvalidRecordPolicy::Skip => {
                self.stats.record_skipped();
                warn!(object = %object, error = %error, "Skipping invalid record");
                Flow::Continue
            }
            InvalidRecordPolicy::Abort => {
                self.stats.record_invalid();
                self.fail(error, Some(object));
                Flow::Stop
            }
        }
    }

    fn accepts(&self, record: &WalkRecord) -> Result<bool> {
        match &self.query_set {
            Some(query_set) => query_set.matches_record(record),
            None => Ok(true),
        }
    }

    async fn offer(&self, record: WalkRecord) -> Flow {
        match self.accepts(&record) {
            Ok(true) => {
                self.stats.record_matched();
                trace!(object = %record.source_object(), index = record.index(), "Delivering record");
                let object = record.source_object().to_string();
                self.deliver(Ok(record), &object).await
            }
            Ok(false) => Flow::Continue,
            Err(e) => self.report_invalid(e, record.source_object()).await,
        }
    }

    async fn process_object(&self, worker: usize, object: ObjectInfo) {
        let name = object.name.as_str();
        let _open = self.stats.open_object();
        debug!(worker = worker, object = %name, size = object.size_bytes, "Reading object");

        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(worker = worker, object = %name, "Cancelled while opening");
                return;
            }
            opened = self.source.open(name) => opened,
        };
        let reader = match opened {
            Ok(reader) => reader,
            Err(e) => {
                self.report_object_error(e, name, WalkStage::Open).await;
                return;
            }
        };

        let mut decoder = JsonlDecoder::new(name, reader, &self.decoder);
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(worker = worker, object = %name, "Cancelled between records");
                    break;
                }
                next = decoder.next_record() => next,
            };

            let flow = match next {
                Ok(Decoded::EndOfSource) => break,
                Ok(Decoded::Record(record)) => {
                    self.stats.record_read();
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    self.offer(record).await
                }
                Ok(Decoded::Invalid(e)) => self.report_invalid(e, name).await,
                Err(e) => self.report_object_error(e, name, WalkStage::Decode).await,
            };

            if let Flow::Stop = flow {
                break;
            }
        }

        self.stats.record_bytes_read(decoder.bytes_read());
        debug!(
            worker = worker,
            object = %decoder.object(),
            records = decoder.records_produced(),
            bytes = decoder.bytes_read(),
            "Finished object"
        );
    }
}

async fn run_worker(id: usize, shared: Arc<WalkShared>, queue: WorkQueue) {
    debug!(worker = id, "Worker started");

    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => None,
                object = rx.recv() => object,
            }
        };

        let Some(object) = next else {
            break;
        };
        if shared.cancel.is_cancelled() {
            break;
        }

        shared.process_object(id, object).await;
    }

    debug!(worker = id, "Worker stopped");
}

async fn dispatch(
    shared: &WalkShared,
    filter: &dyn ObjectFilter,
    prefix: &str,
    tx: mpsc::UnboundedSender<ObjectInfo>,
) {
    let mut objects = match shared.source.list(prefix).await {
        Ok(objects) => objects,
        Err(e) => {
            shared.fail(e, None);
            return;
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            next = objects.next() => next,
        };

        let object = match next {
            None => break,
            Some(Ok(object)) => object,
            Some(Err(e)) => {
                shared.fail(e, None);
                break;
            }
        };

        shared.stats.record_listed();
        if !filter.accept(&object.name) {
            shared.stats.record_filtered();
            debug!(object = %object.name, filter = %filter.description(), "Object rejected");
            continue;
        }

        trace!(object = %object.name, "Queueing object");
        if tx.send(object).is_err() {
            break;
        }
    }
}

/// Walk every object below `prefix` in a caller-owned source.
///
/// The source is not closed. Returns the walk's statistics, or its first
/// fatal error wrapped with the URI and object it happened at. A walk
/// stopped by `cancel` is not an error; its snapshot has `cancelled` set.
pub async fn walk_bucket(
    cancel: &CancellationToken,
    options: &WalkOptions,
    source: Arc<dyn ObjectSource>,
    prefix: &str,
) -> Result<StatsSnapshot> {
    options.validate()?;

    let shared = Arc::new(WalkShared {
        uri: options.uri.clone(),
        source,
        callback: Arc::clone(&options.callback),
        query_set: options.query_set.clone(),
        decoder: options.decoder.clone(),
        invalid_records: options.invalid_records,
        stats: WalkStats::new(),
        cancel: cancel.child_token(),
        failure: Mutex::new(None),
    });

    info!(
        uri = %options.uri,
        source = %shared.source.description(),
        prefix = prefix,
        workers = options.workers,
        filter = %options.object_filter.description(),
        queries = %options
            .query_set
            .as_ref()
            .map(|q| q.description())
            .unwrap_or_else(|| "queries(none)".to_string()),
        "Starting walk"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let queue: WorkQueue = Arc::new(tokio::sync::Mutex::new(rx));

    let handles: Vec<JoinHandle<()>> = (0..options.workers)
        .map(|id| tokio::spawn(run_worker(id, Arc::clone(&shared), Arc::clone(&queue))))
        .collect();

    dispatch(&shared, options.object_filter.as_ref(), prefix, tx).await;

    for (id, result) in join_all(handles).await.into_iter().enumerate() {
        if let Err(e) = result {
            shared.fail(
                WalkError::Other(anyhow::anyhow!("worker {id} panicked: {e}")),
                None,
            );
        }
    }

    if cancel.is_cancelled() {
        shared.stats.mark_cancelled();
    }

    let mut snapshot = shared.stats.snapshot();
    snapshot.completed_at = Some(chrono::Utc::now());

    if let Some(Failure { error, object }) = shared.failure.lock().take() {
        return Err(error.aborted(options.uri.clone(), object));
    }

    info!(
        uri = %options.uri,
        objects = snapshot.objects_opened,
        filtered = snapshot.objects_filtered,
        failed = snapshot.objects_failed,
        records = snapshot.records_read,
        delivered = snapshot.records_delivered,
        peak_open = snapshot.peak_open,
        cancelled = snapshot.cancelled,
        "Walk completed"
    );

    Ok(snapshot)
}

/// Walk several targets of one source in order.
///
/// Stops at the first terminal error or when `cancel` fires. Returns the
/// combined statistics.
pub async fn walk_all(
    cancel: &CancellationToken,
    options: &WalkOptions,
    source: Arc<dyn ObjectSource>,
    targets: &[WalkTarget],
) -> Result<StatsSnapshot> {
    let mut total = StatsSnapshot::default();

    for target in targets {
        if cancel.is_cancelled() {
            total.cancelled = true;
            break;
        }
        let walk = options.clone().with_uri(target.uri.clone());
        let snapshot = walk_bucket(cancel, &walk, Arc::clone(&source), &target.prefix).await?;
        total.merge(&snapshot);
    }

    Ok(total)
}

/// Resolve `options.uri`, walk it, and close the source.
///
/// The source is closed whether or not the walk succeeds.
pub async fn walk_uri(
    cancel: &CancellationToken,
    options: &WalkOptions,
    config: &SourceConfig,
) -> Result<StatsSnapshot> {
    options.validate()?;

    let (source, prefix) = open_source(&options.uri, config)
        .await
        .map_err(|e| e.aborted(options.uri.clone(), None))?;

    let result = walk_bucket(cancel, options, source.clone(), &prefix).await;

    if let Err(e) = source.close().await {
        warn!(uri = %options.uri, error = %e, "Failed to close source");
    }

    result
}
