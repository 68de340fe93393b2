//! Canonical record formatting.

use bw_types::FormatStyle;
use serde_json::Value;

/// Re-serialize a JSON document with sorted object keys.
///
/// The output parses back to a value equal to the input's.
pub fn canonicalize(body: &[u8], style: FormatStyle) -> serde_json::Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(body)?;
    serialize(&value, style)
}

/// Serialize an already parsed value in canonical form.
///
/// `serde_json::Map` is ordered by key unless `preserve_order` is enabled,
/// which this workspace never does.
pub(crate) fn serialize(value: &Value, style: FormatStyle) -> serde_json::Result<Vec<u8>> {
    match style {
        FormatStyle::Compact => serde_json::to_vec(value),
        FormatStyle::Pretty => serde_json::to_vec_pretty(value),
    }
}
