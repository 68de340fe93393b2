//! Query predicates and query sets.

use crate::path::{JsonPath, stringify};
use bw_error::{DecodeError, QueryError, Result, WalkError};
use bw_types::WalkRecord;
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;

/// A single `{PATH}={REGEXP}` predicate.
///
/// The predicate holds if any value extracted at the path, stringified,
/// matches the pattern. If the path selects an array, every element is
/// tested on its own. If the path selects nothing, the predicate fails.
#[derive(Debug, Clone)]
pub struct Query {
    path: JsonPath,
    pattern: Regex,
}

impl Query {
    /// Create a query from a path selector and a regular expression.
    pub fn new(path: &str, pattern: &str) -> Result<Self> {
        let path = JsonPath::parse(path)?;
        let pattern = Regex::new(pattern).map_err(|e| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { path, pattern })
    }

    /// Get the path selector.
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Get the compiled pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Check if the record satisfies this predicate.
    pub fn matches(&self, record: &Value) -> bool {
        self.path
            .select_flattened(record)
            .into_iter()
            .any(|value| self.pattern.is_match(&stringify(value)))
    }
}

impl FromStr for Query {
    type Err = WalkError;

    /// Parse `{PATH}={REGEXP}`, splitting on the first `=`.
    fn from_str(s: &str) -> Result<Self> {
        let (path, pattern) = s
            .split_once('=')
            .ok_or_else(|| QueryError::InvalidQuery(s.to_string()))?;
        if path.trim().is_empty() {
            return Err(QueryError::InvalidQuery(s.to_string()).into());
        }
        Query::new(path, pattern)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.path, self.pattern.as_str())
    }
}

/// How the predicates of a [`QuerySet`] are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// Every predicate must match
    #[default]
    All,
    /// At least one predicate must match
    Any,
}

impl QueryMode {
    /// Keyword used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::All => "all",
            QueryMode::Any => "any",
        }
    }
}

impl FromStr for QueryMode {
    type Err = WalkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(QueryMode::All),
            "any" => Ok(QueryMode::Any),
            other => Err(QueryError::InvalidMode(other.to_string()).into()),
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of predicates and the mode combining them.
///
/// An empty set matches every record in either mode.
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    queries: Vec<Query>,
    mode: QueryMode,
}

impl QuerySet {
    /// Create a query set.
    pub fn new(queries: Vec<Query>, mode: QueryMode) -> Self {
        Self { queries, mode }
    }

    /// Parse a list of `{PATH}={REGEXP}` strings.
    pub fn parse<S: AsRef<str>>(queries: &[S], mode: QueryMode) -> Result<Self> {
        let queries = queries
            .iter()
            .map(|q| q.as_ref().parse::<Query>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(queries, mode))
    }

    /// Add a predicate (builder pattern).
    pub fn with_query(mut self, query: Query) -> Self {
        self.queries.push(query);
        self
    }

    /// Get the predicates.
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Get the mode.
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Get the number of predicates.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Check if no predicates are configured.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Check if a parsed record matches.
    pub fn matches(&self, record: &Value) -> bool {
        if self.queries.is_empty() {
            return true;
        }
        match self.mode {
            QueryMode::All => self.queries.iter().all(|q| q.matches(record)),
            QueryMode::Any => self.queries.iter().any(|q| q.matches(record)),
        }
    }

    /// Check if a decoded record matches.
    ///
    /// An empty set matches without parsing. Otherwise the body must be
    /// valid JSON; the error names the record's object and index.
    pub fn matches_record(&self, record: &WalkRecord) -> Result<bool> {
        if self.queries.is_empty() {
            return Ok(true);
        }
        let value: Value =
            serde_json::from_slice(record.body()).map_err(|e| DecodeError::InvalidJson {
                object: record.source_object().to_string(),
                index: record.index(),
                message: e.to_string(),
            })?;
        Ok(self.matches(&value))
    }

    /// Get a human-readable description for logs.
    pub fn description(&self) -> String {
        if self.queries.is_empty() {
            return "queries(none)".to_string();
        }
        let joined: Vec<String> = self.queries.iter().map(|q| q.to_string()).collect();
        format!("queries({}: {})", self.mode, joined.join(", "))
    }
}
