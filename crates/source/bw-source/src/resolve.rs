//! URI resolution.
//!
//! Resolution happens once, before any object is opened. Everything
//! downstream only sees the resolved [`Location`] and prefix.

use crate::config::SourceConfig;
use bw_error::{Result, SourceError};
use std::path::PathBuf;
use tracing::debug;

/// Where a walk's objects live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A local directory tree
    Local { root: PathBuf },

    /// An S3 bucket
    S3 {
        bucket: String,
        region: String,
        anonymous: bool,
    },
}

/// A URI resolved to a backend location and a prefix inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    /// The caller-supplied URI
    pub original: String,

    /// Backend location
    pub location: Location,

    /// Prefix relative to the location root (no leading `/`)
    pub prefix: String,
}

impl ResolvedUri {
    /// Check if the location is read without credentials.
    pub fn is_anonymous(&self) -> bool {
        matches!(self.location, Location::S3 { anonymous: true, .. })
    }

    /// Canonical URI of the resolved location, without the prefix.
    pub fn root_uri(&self) -> String {
        match &self.location {
            Location::Local { root } => format!("file://{}", root.display()),
            Location::S3 { bucket, region, .. } => format!("s3://{bucket}?region={region}"),
        }
    }
}

/// Resolve a walk URI.
///
/// - Bare paths and `file://` URIs resolve to a local root with an empty prefix.
/// - `s3://bucket/prefix[?region=r]` resolves to that bucket; naming an alias
///   bucket forces anonymous access in the alias region.
/// - `<alias>://prefix` resolves to the alias bucket, anonymously.
pub fn resolve_uri(uri: &str, config: &SourceConfig) -> Result<ResolvedUri> {
    if !uri.contains("://") {
        if uri.is_empty() {
            return Err(SourceError::InvalidUri("empty URI".to_string()).into());
        }
        return Ok(local(uri, PathBuf::from(uri)));
    }

    let url = url::Url::parse(uri)
        .map_err(|e| SourceError::InvalidUri(format!("Invalid URI '{}': {}", uri, e)))?;
    let scheme = url.scheme().to_lowercase();

    let resolved = match scheme.as_str() {
        "file" => {
            let root = url.to_file_path().map_err(|_| {
                SourceError::InvalidUri(format!("Invalid file URI '{}'", uri))
            })?;
            local(uri, root)
        }
        "s3" => {
            let bucket = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| {
                    SourceError::InvalidUri(format!("Missing bucket in S3 URI: {}", uri))
                })?;
            let explicit_region = url
                .query_pairs()
                .find(|(k, _)| k == "region")
                .map(|(_, v)| v.into_owned());

            let (region, anonymous) = match config.alias_for_bucket(bucket) {
                Some(alias) => (alias.region.clone(), true),
                None => (
                    explicit_region.unwrap_or_else(|| config.region.clone()),
                    false,
                ),
            };

            ResolvedUri {
                original: uri.to_string(),
                location: Location::S3 {
                    bucket: bucket.to_string(),
                    region,
                    anonymous,
                },
                prefix: url.path().trim_start_matches('/').to_string(),
            }
        }
        other => {
            let alias = config.alias_for_scheme(other).ok_or_else(|| {
                SourceError::InvalidUri(format!("Unsupported scheme '{}' in URI: {}", other, uri))
            })?;

            // Everything after "scheme://" is a prefix inside the alias bucket.
            let host = url.host_str().unwrap_or_default();
            let path = url.path().trim_start_matches('/');
            let prefix = match (host.is_empty(), path.is_empty()) {
                (true, _) => path.to_string(),
                (false, true) => host.to_string(),
                (false, false) => format!("{host}/{path}"),
            };

            ResolvedUri {
                original: uri.to_string(),
                location: Location::S3 {
                    bucket: alias.bucket.clone(),
                    region: alias.region.clone(),
                    anonymous: true,
                },
                prefix,
            }
        }
    };

    debug!(
        uri = uri,
        root = %resolved.root_uri(),
        prefix = %resolved.prefix,
        anonymous = resolved.is_anonymous(),
        "Resolved source URI"
    );

    Ok(resolved)
}

fn local(uri: &str, root: PathBuf) -> ResolvedUri {
    ResolvedUri {
        original: uri.to_string(),
        location: Location::Local { root },
        prefix: String::new(),
    }
}
