//! Object sources for bucketwalk.
//!
//! This crate resolves walk URIs to storage backends and implements the
//! [`ObjectSource`](bw_traits::ObjectSource) trait on top of `object_store`.
//! Supported locations:
//!
//! - `file:///path` or a bare path - local directory tree
//! - `s3://bucket/prefix` - S3 or an S3-compatible endpoint
//! - `<alias>://prefix` - a configured public bucket, read anonymously
//!
//! # Example
//!
//! ```ignore
//! use bw_source::{BucketAlias, SourceConfig, open_source};
//!
//! let config = SourceConfig::new("us-east-1")
//!     .with_alias(BucketAlias::new(["loc"], "public-bucket", "us-east-1"));
//!
//! let (source, prefix) = open_source("loc://2020/", &config).await?;
//! let mut objects = source.list(&prefix).await?;
//! ```

mod config;
mod resolve;
mod store;

pub use config::{BucketAlias, SourceConfig};
pub use resolve::{Location, ResolvedUri, resolve_uri};
pub use store::{StoreSource, open_source};
