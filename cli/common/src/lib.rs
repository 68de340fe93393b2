//! Shared utilities for bucketwalk command-line tools.
//!
//! Log level selection, logging setup on stderr, and number formatting for
//! summaries printed after a walk.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_duration_secs, format_number};
pub use logging::init_logging;
