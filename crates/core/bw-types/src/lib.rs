//! Core types for bucketwalk.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`WalkRecord`] - One JSON record read from an object
//! - [`ObjectInfo`] - An object discovered by a source listing
//! - [`Compression`], [`FormatStyle`], [`InvalidRecordPolicy`] - Per-walk decoding choices

pub mod object;
pub mod options;
pub mod record;

pub use object::*;
pub use options::*;
pub use record::*;
