//! Core traits for bucketwalk.
//!
//! This crate defines the seams between the walker and its collaborators:
//! - [`ObjectSource`] - List and open objects in a bucket or directory tree
//! - [`RecordCallback`] - Receives every surviving record (or its error)
//! - [`ObjectFilter`] - Decides which listed objects are worth reading

pub mod callback;
pub mod filter;
pub mod source;

pub use callback::*;
pub use filter::*;
pub use source::*;
