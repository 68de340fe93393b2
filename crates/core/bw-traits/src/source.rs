//! Object source trait and related types.

use async_trait::async_trait;
use bw_error::Result;
use bw_types::ObjectInfo;
use futures::Stream;
use std::pin::Pin;
use tokio::io::AsyncBufRead;

/// A lazy, finite stream of listed objects.
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<ObjectInfo>> + Send>>;

/// A buffered byte stream for one object.
pub type ObjectReader = Pin<Box<dyn AsyncBufRead + Send>>;

/// Trait for storage backends that can enumerate and open objects.
///
/// A source is shared read-only by every worker of a walk, so
/// implementations must be safe to call concurrently.
///
/// # Implementations
///
/// - `StoreSource`: local filesystem and S3 via `object_store`
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Lists the objects under `prefix`.
    ///
    /// The returned stream is not restartable; call `list` again to
    /// re-enumerate.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix relative to the source root; empty lists everything
    async fn list(&self, prefix: &str) -> Result<ObjectStream>;

    /// Opens an object for streaming.
    ///
    /// # Errors
    ///
    /// `SourceError::NotFound` if the object does not exist,
    /// `SourceError::Unreadable` if the backend refuses or fails to serve it.
    async fn open(&self, name: &str) -> Result<ObjectReader>;

    /// Releases any session held by the source.
    ///
    /// Must be idempotent: only the first call has an effect.
    async fn close(&self) -> Result<()>;

    /// Human-readable description for logs.
    fn description(&self) -> String;
}
