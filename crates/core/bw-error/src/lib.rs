//! Error types and classification for bucketwalk.
//!
//! This crate provides:
//! - [`WalkError`] - Top-level error enum for every walk failure
//! - Domain-specific errors ([`SourceError`], [`DecodeError`], [`QueryError`])
//! - [`ErrorScope`] for deciding whether an error ends the walk or is handed
//!   to the record callback
//! - Error classification logic based on error type and walk stage

use thiserror::Error;

/// Top-level error type for bucketwalk.
#[derive(Error, Debug)]
pub enum WalkError {
    /// Object source errors (resolve, list, open)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Stream decoding errors (read, decompress, parse)
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Query parsing errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal error of a walk, annotated with where it happened.
    #[error("Walk of '{uri}' aborted{}: {source}", object_suffix(.object))]
    Aborted {
        uri: String,
        object: Option<String>,
        #[source]
        source: Box<WalkError>,
    },

    /// Generic errors (wrapped anyhow), typically returned by callbacks
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn object_suffix(object: &Option<String>) -> String {
    match object {
        Some(name) => format!(" at object '{name}'"),
        None => String::new(),
    }
}

/// Object source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    /// URI could not be parsed or uses an unsupported scheme
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Backend could not be reached or configured
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Listing objects failed
    #[error("List failed: {0}")]
    List(String),

    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Object exists but cannot be read (access denied, I/O failure)
    #[error("Object unreadable: '{object}': {message}")]
    Unreadable { object: String, message: String },

    /// Source was used after being closed
    #[error("Source closed: {0}")]
    Closed(String),
}

/// Stream decoding errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// I/O error while reading the object stream
    #[error("I/O error reading '{object}': {message}")]
    Io { object: String, message: String },

    /// Record is not valid JSON
    #[error("Invalid JSON in '{object}' at record {index}: {message}")]
    InvalidJson {
        object: String,
        index: u64,
        message: String,
    },

    /// Decompression failed
    #[error("Decompression failed for '{object}': {message}")]
    Decompression { object: String, message: String },

    /// Re-formatting a record failed
    #[error("Failed to format record {index} of '{object}': {message}")]
    Format {
        object: String,
        index: u64,
        message: String,
    },
}

/// Query parsing errors.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query text is not `{PATH}={REGEXP}`
    #[error("Invalid query '{0}', expected {{PATH}}={{REGEXP}}")]
    InvalidQuery(String),

    /// Pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Unknown query mode keyword
    #[error("Invalid query mode '{0}', expected 'all' or 'any'")]
    InvalidMode(String),
}

/// How far an error reaches.
///
/// Used to decide whether an error terminates the walk or is delivered to
/// the record callback, which then decides fatality itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Fatal for the whole walk
    ///
    /// Examples: bucket cannot be opened or listed, callback returned an error
    Walk,

    /// Local to one object, reported to the callback with no record
    ///
    /// Examples: object not found, stream interrupted, corrupt compression
    Object,

    /// Local to one record, reported to the callback
    ///
    /// Examples: malformed JSON line, formatting failure
    Record,
}

/// Stage of a walk, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStage {
    /// Resolving the URI and opening the source
    Resolve,

    /// Enumerating objects
    List,

    /// Opening a single object
    Open,

    /// Reading and splitting the object stream
    Decode,

    /// Validating or re-formatting a record
    Record,

    /// Running the caller's callback
    Callback,
}

impl std::fmt::Display for WalkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve => write!(f, "Resolve"),
            Self::List => write!(f, "List"),
            Self::Open => write!(f, "Open"),
            Self::Decode => write!(f, "Decode"),
            Self::Record => write!(f, "Record"),
            Self::Callback => write!(f, "Callback"),
        }
    }
}

/// Classifies an error to determine how far it propagates.
///
/// # Arguments
///
/// * `error` - The error to classify
/// * `stage` - The walk stage where the error occurred
///
/// # Returns
///
/// The [`ErrorScope`] of the error
pub fn classify_error(error: &WalkError, stage: WalkStage) -> ErrorScope {
    match stage {
        WalkStage::Resolve | WalkStage::List | WalkStage::Callback => ErrorScope::Walk,
        WalkStage::Open | WalkStage::Decode | WalkStage::Record => match error {
            WalkError::Source(e) => classify_source_error(e),
            WalkError::Decode(e) => classify_decode_error(e),
            WalkError::Query(_) | WalkError::Config(_) => ErrorScope::Walk,
            WalkError::Aborted { .. } => ErrorScope::Walk,
            WalkError::Other(_) => ErrorScope::Object,
        },
    }
}

fn classify_source_error(error: &SourceError) -> ErrorScope {
    match error {
        SourceError::InvalidUri(_) => ErrorScope::Walk,
        SourceError::Connection(_) => ErrorScope::Walk,
        SourceError::List(_) => ErrorScope::Walk,
        SourceError::NotFound(_) => ErrorScope::Object,
        SourceError::Unreadable { .. } => ErrorScope::Object,
        SourceError::Closed(_) => ErrorScope::Walk,
    }
}

fn classify_decode_error(error: &DecodeError) -> ErrorScope {
    match error {
        DecodeError::Io { .. } => ErrorScope::Object,
        DecodeError::Decompression { .. } => ErrorScope::Object,
        DecodeError::InvalidJson { .. } => ErrorScope::Record,
        DecodeError::Format { .. } => ErrorScope::Record,
    }
}

impl WalkError {
    /// Wrap this error as the terminal error of a walk over `uri`.
    ///
    /// Already-wrapped errors are returned unchanged so context is never
    /// nested twice.
    pub fn aborted(self, uri: impl Into<String>, object: Option<String>) -> Self {
        match self {
            e @ WalkError::Aborted { .. } => e,
            e => WalkError::Aborted {
                uri: uri.into(),
                object,
                source: Box::new(e),
            },
        }
    }

    /// Name of the object this error refers to, if it carries one.
    pub fn object(&self) -> Option<&str> {
        match self {
            WalkError::Source(SourceError::NotFound(object))
            | WalkError::Source(SourceError::Unreadable { object, .. }) => Some(object),
            WalkError::Decode(DecodeError::Io { object, .. })
            | WalkError::Decode(DecodeError::InvalidJson { object, .. })
            | WalkError::Decode(DecodeError::Decompression { object, .. })
            | WalkError::Decode(DecodeError::Format { object, .. }) => Some(object),
            WalkError::Aborted { object, .. } => object.as_deref(),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through [`WalkError::Aborted`].
    pub fn root(&self) -> &WalkError {
        match self {
            WalkError::Aborted { source, .. } => source.root(),
            e => e,
        }
    }
}

/// Result type alias using WalkError.
pub type Result<T> = std::result::Result<T, WalkError>;
