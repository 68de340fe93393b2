//! Record callback trait.

use async_trait::async_trait;
use bw_error::{Result, WalkError};
use bw_types::WalkRecord;

/// What a callback receives: a record, or the error that stood in its place.
pub type RecordResult = std::result::Result<WalkRecord, WalkError>;

/// Trait for consumers of walked records.
///
/// Invoked once per surviving record, possibly from many workers at the
/// same time. Calls for records of the same object never overlap and arrive
/// in object order. Returning an error aborts the walk.
///
/// Per-object and per-record failures arrive as `Err`. Returning `Ok(())`
/// for those lets the walk continue.
#[async_trait]
pub trait RecordCallback: Send + Sync {
    /// Handle one record or record-scoped error.
    async fn on_record(&self, item: RecordResult) -> Result<()>;
}

/// Adapter turning a synchronous closure into a [`RecordCallback`].
///
/// # Example
///
/// ```
/// use bw_traits::{FnCallback, RecordResult};
///
/// let callback = FnCallback::new(|item: RecordResult| {
///     if let Ok(record) = item {
///         println!("{}", String::from_utf8_lossy(record.body()));
///     }
///     Ok(())
/// });
/// # let _ = callback;
/// ```
pub struct FnCallback<F> {
    f: F,
}

impl<F> FnCallback<F>
where
    F: Fn(RecordResult) -> Result<()> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> RecordCallback for FnCallback<F>
where
    F: Fn(RecordResult) -> Result<()> + Send + Sync,
{
    async fn on_record(&self, item: RecordResult) -> Result<()> {
        (self.f)(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_callback_invokes_closure() {
        let seen = AtomicUsize::new(0);
        let callback = FnCallback::new(|item: RecordResult| {
            assert!(item.is_ok());
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        callback
            .on_record(Ok(WalkRecord::new("{}", "a.jsonl", 0)))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fn_callback_propagates_error() {
        let callback = FnCallback::new(|_item: RecordResult| Err(anyhow::anyhow!("stop").into()));

        let result = callback
            .on_record(Ok(WalkRecord::new("{}", "a.jsonl", 0)))
            .await;
        assert!(result.is_err());
    }
}
