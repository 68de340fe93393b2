//! `object_store`-backed object source.

use crate::config::SourceConfig;
use crate::resolve::{Location, ResolvedUri, resolve_uri};
use async_trait::async_trait;
use bw_error::{Result, SourceError, WalkError};
use bw_traits::{ObjectReader, ObjectSource, ObjectStream};
use bw_types::ObjectInfo;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectMeta, ObjectStore};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::BufReader;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

/// Default read buffer for object streams.
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Create HTTP client options for S3 connection pooling.
///
/// The walker keeps up to `workers` objects open at once, each on its own
/// connection, so the idle pool must be at least that large.
fn create_s3_client_options() -> ClientOptions {
    ClientOptions::new()
        .with_pool_max_idle_per_host(100)
        .with_pool_idle_timeout(Duration::from_secs(90))
        .with_timeout(Duration::from_secs(300))
        .with_connect_timeout(Duration::from_secs(10))
        .with_http2_keep_alive_interval(Duration::from_secs(30))
        .with_http2_keep_alive_timeout(Duration::from_secs(20))
        .with_http2_keep_alive_while_idle()
}

/// Object source over any [`ObjectStore`].
///
/// The store handle is shared read-only by every worker of a walk. Closing
/// the source drops the handle (and with it any pooled connections); the
/// first `close` does the work and later calls are no-ops.
pub struct StoreSource {
    /// Description of the resolved location, for logs and errors
    root: String,

    /// The store, `None` once closed
    store: RwLock<Option<Arc<dyn ObjectStore>>>,

    /// Whether `close` has run
    closed: AtomicBool,

    /// Read buffer size for opened objects
    buffer_size: usize,
}

impl StoreSource {
    /// Wrap an existing store.
    pub fn from_store(store: Arc<dyn ObjectStore>, root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            store: RwLock::new(Some(store)),
            closed: AtomicBool::new(false),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Build the store for a resolved URI.
    pub fn from_resolved(resolved: &ResolvedUri, config: &SourceConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match &resolved.location {
            Location::Local { root } => {
                debug!(root = %root.display(), "Creating local filesystem object store");
                let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
                    SourceError::Connection(format!(
                        "Failed to open directory '{}': {}",
                        root.display(),
                        e
                    ))
                })?;
                Arc::new(store)
            }
            Location::S3 {
                bucket,
                region,
                anonymous,
            } => {
                debug!(
                    bucket = %bucket,
                    region = %region,
                    anonymous = anonymous,
                    "Creating S3 object store"
                );
                Arc::new(build_s3_store(bucket, region, *anonymous, config)?)
            }
        };

        Ok(Self::from_store(store, resolved.root_uri()))
    }

    /// Set the read buffer size used for opened objects.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Check if the source has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn store(&self) -> Result<Arc<dyn ObjectStore>> {
        self.store
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| SourceError::Closed(self.root.clone()).into())
    }
}

fn build_s3_store(
    bucket: &str,
    region: &str,
    anonymous: bool,
    config: &SourceConfig,
) -> Result<object_store::aws::AmazonS3> {
    let mut builder = if anonymous {
        AmazonS3Builder::new().with_skip_signature(true)
    } else if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let mut builder = AmazonS3Builder::new()
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key);
        if let Some(token) = &config.session_token {
            builder = builder.with_token(token);
        }
        builder
    } else {
        // Let the backend client pick up credentials from the environment.
        AmazonS3Builder::from_env()
    };

    builder = builder
        .with_bucket_name(bucket)
        .with_region(region)
        .with_client_options(create_s3_client_options());

    if let Some(endpoint) = &config.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(true)
            .with_virtual_hosted_style_request(false);
    }

    builder.build().map_err(|e| {
        SourceError::Connection(format!("Failed to create S3 object store for '{bucket}': {e}"))
            .into()
    })
}

fn object_info(meta: ObjectMeta) -> ObjectInfo {
    ObjectInfo::new(meta.location.to_string(), meta.size as u64)
        .with_last_modified(meta.last_modified)
}

fn map_get_error(name: &str, error: object_store::Error) -> WalkError {
    match error {
        object_store::Error::NotFound { .. } => SourceError::NotFound(name.to_string()).into(),
        e => SourceError::Unreadable {
            object: name.to_string(),
            message: e.to_string(),
        }
        .into(),
    }
}

#[async_trait]
impl ObjectSource for StoreSource {
    async fn list(&self, prefix: &str) -> Result<ObjectStream> {
        let store = self.store()?;
        let trimmed = prefix.trim_matches('/');
        let prefix = (!trimmed.is_empty()).then(|| ObjectPath::from(trimmed));
        let root = self.root.clone();

        debug!(root = %root, prefix = ?prefix, "Listing objects");

        let stream = async_stream::stream! {
            let mut listing = store.list(prefix.as_ref());
            while let Some(item) = listing.next().await {
                yield item.map(object_info).map_err(|e| {
                    WalkError::from(SourceError::List(format!("Failed to list '{}': {}", root, e)))
                });
            }
        };

        Ok(Box::pin(stream))
    }

    async fn open(&self, name: &str) -> Result<ObjectReader> {
        let store = self.store()?;
        let path = ObjectPath::from(name);

        let result = store
            .get(&path)
            .await
            .map_err(|e| map_get_error(name, e))?;

        let bytes_stream = result
            .into_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let reader = StreamReader::new(bytes_stream);

        Ok(Box::pin(BufReader::with_capacity(self.buffer_size, reader)))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.store.write().take();
        info!(root = %self.root, "Closed object source");
        Ok(())
    }

    fn description(&self) -> String {
        self.root.clone()
    }
}

/// Resolve `uri` and open a source for it.
///
/// Returns the source and the prefix inside it that the URI names.
pub async fn open_source(uri: &str, config: &SourceConfig) -> Result<(Arc<StoreSource>, String)> {
    let resolved = resolve_uri(uri, config)?;
    let source = StoreSource::from_resolved(&resolved, config)?;

    info!(
        uri = uri,
        root = %source.description(),
        anonymous = resolved.is_anonymous(),
        "Opened object source"
    );

    Ok((Arc::new(source), resolved.prefix))
}
