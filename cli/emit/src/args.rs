//! CLI argument definitions for bw-emit.

use bw_query::QueryMode;
use bw_types::{Compression, InvalidRecordPolicy};
use bw_walker::{DEFAULT_EXCLUDE, DEFAULT_WORKERS};
use clap::{ArgAction, Parser, ValueEnum};
pub use bw_cli_common::LogLevel;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get the version string with build metadata.
fn version_string() -> &'static str {
    let version = env!("CARGO_PKG_VERSION");
    let commit = built_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown");
    let date = built_info::BUILT_TIME_UTC;
    let s = format!("{version} ({commit} {date})");
    // Only built once, for --version.
    Box::leak(s.into_boxed_str())
}

/// Stream the JSONL records of a bucket to stdout.
///
/// Objects below the bucket URI (or below each PREFIX inside it) are read
/// concurrently; records from one object keep their order, records from
/// different objects interleave.
///
/// ## Examples
///
/// Every record of a local directory tree:
///   bw-emit -b /data/jsonl
///
/// Records with coordinates from a public bucket, via an alias scheme:
///   bw-emit -b loc:// --alias-scheme loc --alias-bucket my-public-bucket \
///     --decompress -q 'latlong=.*' 2020 2021
///
/// Canonical, sorted-key output as one JSON array:
///   bw-emit -b s3://bucket/items --format-json --json
#[derive(Parser, Debug)]
#[command(name = "bw-emit")]
#[command(version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Prefixes inside the bucket URI to walk, one after another
    #[arg(value_name = "PREFIX")]
    pub prefixes: Vec<String>,

    // === Source ===
    /// Bucket URI: s3://bucket[/prefix][?region=r], file:///dir, a local path, or <alias>://[prefix]
    #[arg(short = 'b', long, env = "BW_BUCKET_URI")]
    pub bucket_uri: String,

    /// Number of objects read concurrently (must be >= 1)
    #[arg(short = 'w', long, env = "BW_WORKERS", default_value_t = DEFAULT_WORKERS, value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Object basenames to skip (glob, repeatable)
    #[arg(long = "exclude", value_name = "GLOB", default_values_t = [DEFAULT_EXCLUDE.to_string()])]
    pub exclude: Vec<String>,

    /// Read every listed object, including the default exclusions
    #[arg(long, conflicts_with = "exclude")]
    pub no_exclude: bool,

    /// Match --exclude patterns against the full object name, not the basename
    #[arg(long, conflicts_with = "no_exclude")]
    pub exclude_full_path: bool,

    // === Decoding ===
    /// Objects are bzip2-compressed (shorthand for --compression bzip2)
    #[arg(long, conflicts_with = "compression")]
    pub decompress: bool,

    /// Compression applied to every object
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Check that every record is valid JSON
    #[arg(long)]
    pub validate_json: bool,

    /// Re-serialize records with sorted keys (implies --validate-json)
    #[arg(long)]
    pub format_json: bool,

    /// Indent re-serialized records
    #[arg(long, requires = "format_json")]
    pub pretty: bool,

    /// What to do with records that fail validation or re-formatting
    #[arg(long, value_enum, default_value = "report")]
    pub invalid_records: InvalidRecordsArg,

    // === Filtering ===
    /// Record predicate PATH=REGEXP (repeatable)
    #[arg(short = 'q', long = "query", value_name = "PATH=REGEXP")]
    pub queries: Vec<String>,

    /// How predicates combine
    #[arg(long, value_enum, default_value = "all")]
    pub query_mode: QueryModeArg,

    // === Output ===
    /// Write records to stdout
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub stdout: bool,

    /// Discard records; only count them
    #[arg(long)]
    pub null: bool,

    /// Emit one JSON array instead of one record per line
    #[arg(long, conflicts_with = "null")]
    pub json: bool,

    /// Print a summary to stderr when done
    #[arg(long)]
    pub stats: bool,

    // === AWS Configuration ===
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "BW_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// AWS session token
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    // === Public bucket alias ===
    /// URI schemes that stand for the public bucket (comma-separated)
    #[arg(long = "alias-scheme", env = "BW_ALIAS_SCHEMES", value_delimiter = ',', requires = "alias_bucket")]
    pub alias_schemes: Vec<String>,

    /// Public bucket read without credentials
    #[arg(long, env = "BW_ALIAS_BUCKET")]
    pub alias_bucket: Option<String>,

    /// Region of the public bucket
    #[arg(long, env = "BW_ALIAS_REGION", default_value = "us-east-1")]
    pub alias_region: String,

    // === Logging ===
    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Compression selected by --compression or --decompress.
    pub fn compression(&self) -> Compression {
        match (self.compression, self.decompress) {
            (Some(arg), _) => arg.into(),
            (None, true) => Compression::Bzip2,
            (None, false) => Compression::None,
        }
    }

    /// Exclusion patterns in effect.
    pub fn exclusions(&self) -> &[String] {
        if self.no_exclude {
            &[]
        } else {
            &self.exclude
        }
    }

    /// Check if records are written anywhere.
    pub fn writes_records(&self) -> bool {
        self.stdout && !self.null
    }
}

/// Compression argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompressionArg {
    /// Plain JSONL
    None,
    /// bzip2
    Bzip2,
    /// gzip
    Gzip,
    /// Zstandard
    Zstd,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Compression::None,
            CompressionArg::Bzip2 => Compression::Bzip2,
            CompressionArg::Gzip => Compression::Gzip,
            CompressionArg::Zstd => Compression::Zstd,
        }
    }
}

/// Query mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QueryModeArg {
    /// Every predicate must match
    All,
    /// At least one predicate must match
    Any,
}

impl From<QueryModeArg> for QueryMode {
    fn from(arg: QueryModeArg) -> Self {
        match arg {
            QueryModeArg::All => QueryMode::All,
            QueryModeArg::Any => QueryMode::Any,
        }
    }
}

/// Invalid-record policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InvalidRecordsArg {
    /// Log the error and keep going
    Report,
    /// Drop the record silently (counted in --stats)
    Skip,
    /// Stop with an error
    Abort,
}

impl From<InvalidRecordsArg> for InvalidRecordPolicy {
    fn from(arg: InvalidRecordsArg) -> Self {
        match arg {
            InvalidRecordsArg::Report => InvalidRecordPolicy::Report,
            InvalidRecordsArg::Skip => InvalidRecordPolicy::Skip,
            InvalidRecordsArg::Abort => InvalidRecordPolicy::Abort,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
