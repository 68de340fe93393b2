//! Streaming JSONL decoder for bucketwalk.
//!
//! Turns one object's byte stream into a sequence of [`Decoded`] items:
//! records, per-record failures, and a final [`Decoded::EndOfSource`].
//!
//! # Example
//!
//! ```
//! use bw_reader_jsonl::{Decoded, DecoderConfig, JsonlDecoder};
//!
//! # async fn example() -> bw_error::Result<()> {
//! let body: &'static [u8] = b"{\"id\": 1}\n{\"id\": 2}\n";
//! let mut decoder = JsonlDecoder::new(
//!     "items.jsonl",
//!     Box::pin(std::io::Cursor::new(body)),
//!     &DecoderConfig::default(),
//! );
//!
//! while let Decoded::Record(record) = decoder.next_record().await? {
//!     println!("{}: {:?}", record.index(), record.body());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod decoder;
mod format;

pub use config::DecoderConfig;
pub use decoder::{Decoded, JsonlDecoder};
pub use format::canonicalize;
