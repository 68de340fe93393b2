//! Glob-based object filters.

use bw_error::{Result, WalkError};
use bw_traits::ObjectFilter;
use glob::Pattern;

/// Default exclusion: index files published next to the data objects.
pub const DEFAULT_EXCLUDE: &str = "index*";

/// Matches object names against a glob pattern.
///
/// Matches against the basename (after the last `/`) by default, so
/// `*.jsonl` matches objects in any directory.
///
/// # Example
///
/// ```
/// use bw_walker::PatternFilter;
/// use bw_traits::ObjectFilter;
///
/// let filter = PatternFilter::new("*.jsonl").unwrap();
///
/// assert!(filter.accept("2020/items.jsonl"));
/// assert!(!filter.accept("2020/index.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct PatternFilter {
    pattern: String,
    compiled: Pattern,
    match_full_path: bool,
}

impl PatternFilter {
    /// Create a new pattern filter.
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern)
            .map_err(|e| WalkError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            compiled,
            match_full_path: false,
        })
    }

    /// Match against the full object name instead of the basename.
    pub fn with_match_full_path(mut self, match_full_path: bool) -> Self {
        self.match_full_path = match_full_path;
        self
    }

    /// Check if an object name matches the pattern.
    pub fn matches(&self, name: &str) -> bool {
        let target = if self.match_full_path {
            name
        } else {
            name.rsplit('/').next().unwrap_or(name)
        };
        self.compiled.matches(target)
    }

    /// Get the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl ObjectFilter for PatternFilter {
    fn accept(&self, name: &str) -> bool {
        self.matches(name)
    }

    fn description(&self) -> String {
        if self.match_full_path {
            format!("pattern(full_path='{}')", self.pattern)
        } else {
            format!("pattern('{}')", self.pattern)
        }
    }
}

/// Rejects objects matching any of a set of patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<PatternFilter>,
}

impl ExcludeFilter {
    /// Create a filter excluding every basename matching one of `patterns`.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| PatternFilter::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Match every pattern against the full object name instead of the basename.
    pub fn with_match_full_path(mut self, match_full_path: bool) -> Self {
        self.patterns = self
            .patterns
            .into_iter()
            .map(|p| p.with_match_full_path(match_full_path))
            .collect();
        self
    }

    /// Get the number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl ObjectFilter for ExcludeFilter {
    fn accept(&self, name: &str) -> bool {
        !self.patterns.iter().any(|p| p.matches(name))
    }

    fn description(&self) -> String {
        let patterns: Vec<&str> = self.patterns.iter().map(|p| p.pattern()).collect();
        format!("exclude({})", patterns.join(", "))
    }
}
