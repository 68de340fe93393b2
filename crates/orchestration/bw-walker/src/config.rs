//! Walk options.

use bw_error::{Result, WalkError};
use bw_query::QuerySet;
use bw_reader_jsonl::DecoderConfig;
use bw_traits::{AcceptAll, ObjectFilter, RecordCallback};
use bw_types::InvalidRecordPolicy;
use std::sync::Arc;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Everything a single walk needs besides the object source.
#[derive(Clone)]
pub struct WalkOptions {
    /// URI being walked; used for logs and error context
    pub uri: String,

    /// Maximum number of objects read concurrently
    pub workers: usize,

    /// Receives every surviving record and every reported error
    pub callback: Arc<dyn RecordCallback>,

    /// Decides which listed objects are read
    pub object_filter: Arc<dyn ObjectFilter>,

    /// Record predicates; `None` delivers every record
    pub query_set: Option<QuerySet>,

    /// Decoding choices shared by every object
    pub decoder: DecoderConfig,

    /// What happens to records that fail validation or formatting
    pub invalid_records: InvalidRecordPolicy,
}

impl WalkOptions {
    /// Create options for walking `uri` with defaults for everything else.
    pub fn new(uri: impl Into<String>, callback: Arc<dyn RecordCallback>) -> Self {
        Self {
            uri: uri.into(),
            workers: DEFAULT_WORKERS,
            callback,
            object_filter: Arc::new(AcceptAll),
            query_set: None,
            decoder: DecoderConfig::default(),
            invalid_records: InvalidRecordPolicy::default(),
        }
    }

    /// Set the URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the object filter.
    pub fn with_object_filter(mut self, filter: Arc<dyn ObjectFilter>) -> Self {
        self.object_filter = filter;
        self
    }

    /// Set the query set. Empty sets are dropped.
    pub fn with_query_set(mut self, query_set: QuerySet) -> Self {
        self.query_set = (!query_set.is_empty()).then_some(query_set);
        self
    }

    /// Set the decoder configuration.
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the invalid-record policy.
    pub fn with_invalid_records(mut self, policy: InvalidRecordPolicy) -> Self {
        self.invalid_records = policy;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(WalkError::Config("uri must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(WalkError::Config(
                "workers must be greater than 0".to_string(),
            ));
        }
        self.decoder.validate()
    }
}

impl std::fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkOptions")
            .field("uri", &self.uri)
            .field("workers", &self.workers)
            .field("object_filter", &self.object_filter.description())
            .field(
                "query_set",
                &self.query_set.as_ref().map(|q| q.description()),
            )
            .field("decoder", &self.decoder)
            .field("invalid_records", &self.invalid_records)
            .finish_non_exhaustive()
    }
}
