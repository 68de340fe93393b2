//! Query filtering for JSON records.
//!
//! A [`QuerySet`] holds `{PATH}={REGEXP}` predicates combined in
//! [`QueryMode::All`] or [`QueryMode::Any`] mode. Evaluation is pure and can
//! be shared across workers without synchronization.
//!
//! # Example
//!
//! ```
//! use bw_query::{Query, QueryMode, QuerySet};
//! use bw_types::WalkRecord;
//!
//! let set = QuerySet::new(vec!["latlong=.*".parse::<Query>().unwrap()], QueryMode::All);
//!
//! let located = WalkRecord::new(r#"{"latlong":[1.0,2.0]}"#, "items.jsonl", 0);
//! let other = WalkRecord::new(r#"{"other":"x"}"#, "items.jsonl", 1);
//! assert!(set.matches_record(&located).unwrap());
//! assert!(!set.matches_record(&other).unwrap());
//! ```

mod path;
mod query;

pub use path::{JsonPath, Segment, stringify};
pub use query::{Query, QueryMode, QuerySet};
