//! Concurrent bucket walker.
//!
//! Lists the objects below a URI, reads them with a bounded pool of workers,
//! filters the JSONL records they contain, and hands every surviving record
//! to a caller-supplied callback.
//!
//! # Example
//!
//! ```no_run
//! use bw_source::SourceConfig;
//! use bw_traits::{FnCallback, RecordResult};
//! use bw_walker::{WalkOptions, walk_uri};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> bw_error::Result<()> {
//! let callback = Arc::new(FnCallback::new(|item: RecordResult| {
//!     if let Ok(record) = item {
//!         println!("{}", String::from_utf8_lossy(record.body()));
//!     }
//!     Ok(())
//! }));
//!
//! let options = WalkOptions::new("file:///data/jsonl", callback).with_workers(4);
//! let stats = walk_uri(&CancellationToken::new(), &options, &SourceConfig::default()).await?;
//! println!("{} records", stats.records_delivered);
//! # Ok(())
//! # }
//! ```

mod config;
mod filter;
mod stats;
mod walker;

pub use config::{DEFAULT_WORKERS, WalkOptions};
pub use filter::{DEFAULT_EXCLUDE, ExcludeFilter, PatternFilter};
pub use stats::{OpenGuard, StatsSnapshot, WalkStats};
pub use walker::{WalkTarget, walk_all, walk_bucket, walk_uri};
