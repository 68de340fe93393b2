//! Dotted/bracket path selectors over JSON values.

use bw_error::{QueryError, Result};
use serde_json::Value;

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key; applied to an array it selects the key in every element
    Key(String),
    /// Array index; a numeric key on an object is still looked up as a key
    Index(usize),
    /// Every child of an object or array
    Wildcard,
}

/// A compiled path selector such as `item.subjects[0]` or `latlong`.
///
/// Syntax:
/// - `a.b.c` walks nested object keys
/// - `a[2]` or `a.2` indexes into an array
/// - `*` selects every child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a path selector.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidQuery(raw.to_string()).into());
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            parse_part(part, raw, &mut segments)?;
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Get the original selector text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Select the values at this path.
    ///
    /// Returns an empty vector when the path selects nothing. A path that
    /// ends on an array yields the array itself; callers that want its
    /// elements flatten it (see [`JsonPath::select_flattened`]).
    pub fn select<'v>(&self, root: &'v Value) -> Vec<&'v Value> {
        let mut current = vec![root];

        for segment in &self.segments {
            let mut next = Vec::with_capacity(current.len());
            for value in current {
                step(value, segment, &mut next);
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current
    }

    /// Select the values at this path, expanding a selected array into its
    /// elements.
    pub fn select_flattened<'v>(&self, root: &'v Value) -> Vec<&'v Value> {
        let mut out = Vec::new();
        for value in self.select(root) {
            match value {
                Value::Array(items) => out.extend(items.iter()),
                other => out.push(other),
            }
        }
        out
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_part(part: &str, raw: &str, segments: &mut Vec<Segment>) -> Result<()> {
    let invalid = || QueryError::InvalidQuery(raw.to_string());

    let (head, mut rest) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if head.is_empty() && rest.is_empty() {
        return Err(invalid().into());
    }

    if !head.is_empty() {
        segments.push(match head {
            "*" => Segment::Wildcard,
            key => match key.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Key(key.to_string()),
            },
        });
    }

    while !rest.is_empty() {
        let close = rest.find(']').ok_or_else(invalid)?;
        let inner = &rest[1..close];
        segments.push(match inner {
            "*" => Segment::Wildcard,
            n => Segment::Index(n.parse::<usize>().map_err(|_| invalid())?),
        });
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(invalid().into());
        }
    }

    Ok(())
}

fn step<'v>(value: &'v Value, segment: &Segment, out: &mut Vec<&'v Value>) {
    match (segment, value) {
        (Segment::Key(key), Value::Object(map)) => {
            if let Some(v) = map.get(key) {
                out.push(v);
            }
        }
        (Segment::Key(_), Value::Array(items)) => {
            for item in items {
                step(item, segment, out);
            }
        }
        (Segment::Index(i), Value::Array(items)) => {
            if let Some(v) = items.get(*i) {
                out.push(v);
            }
        }
        (Segment::Index(i), Value::Object(map)) => {
            if let Some(v) = map.get(&i.to_string()) {
                out.push(v);
            }
        }
        (Segment::Wildcard, Value::Object(map)) => out.extend(map.values()),
        (Segment::Wildcard, Value::Array(items)) => out.extend(items.iter()),
        _ => {}
    }
}

/// Render a JSON value as the string patterns are matched against.
///
/// Strings are used verbatim, scalars use their JSON text, and objects or
/// nested arrays are rendered as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
