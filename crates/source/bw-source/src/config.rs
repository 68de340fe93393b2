//! Source configuration.

use serde::{Deserialize, Serialize};

/// A URI scheme bound to a fixed public bucket.
///
/// Any URI using one of `schemes` is rewritten to `s3://{bucket}/...` in
/// `region` and read with anonymous credentials. An `s3://` URI naming
/// `bucket` directly is read anonymously as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAlias {
    /// Schemes that select this bucket (e.g. `loc`)
    pub schemes: Vec<String>,

    /// Bucket name
    pub bucket: String,

    /// Bucket region
    pub region: String,
}

impl BucketAlias {
    /// Create a new alias.
    pub fn new<I, S>(schemes: I, bucket: impl Into<String>, region: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(|s| s.into().to_lowercase()).collect(),
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Check if `scheme` selects this alias.
    pub fn matches_scheme(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

/// Configuration for opening object sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// AWS region for S3 access
    pub region: String,

    /// Optional S3 endpoint URL (for LocalStack or other S3-compatible stores)
    pub endpoint: Option<String>,

    /// Optional AWS access key ID
    pub access_key: Option<String>,

    /// Optional AWS secret access key
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,

    /// Optional AWS session token (for temporary credentials)
    #[serde(skip_serializing)]
    pub session_token: Option<String>,

    /// Public bucket aliases
    pub aliases: Vec<BucketAlias>,
}

impl SourceConfig {
    /// Create a new configuration for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    /// Set the S3 endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set AWS credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.session_token = session_token;
        self
    }

    /// Add a public bucket alias.
    pub fn with_alias(mut self, alias: BucketAlias) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Find the alias selected by `scheme`.
    pub fn alias_for_scheme(&self, scheme: &str) -> Option<&BucketAlias> {
        self.aliases.iter().find(|a| a.matches_scheme(scheme))
    }

    /// Find the alias bound to `bucket`.
    pub fn alias_for_bucket(&self, bucket: &str) -> Option<&BucketAlias> {
        self.aliases.iter().find(|a| a.bucket == bucket)
    }

    /// Check if explicit credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}
