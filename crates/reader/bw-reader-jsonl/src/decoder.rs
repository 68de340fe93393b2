//! Line-oriented record decoder.

use crate::config::DecoderConfig;
use crate::format;
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, ZstdDecoder};
use bw_error::{DecodeError, Result, WalkError};
use bw_traits::ObjectReader;
use bw_types::{Compression, FormatStyle, WalkRecord};
use bytes::Bytes;
use serde::de::IgnoredAny;
use std::io::ErrorKind;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::trace;

/// One step of decoding an object.
#[derive(Debug)]
pub enum Decoded {
    /// A record ready for filtering
    Record(WalkRecord),

    /// A record that failed validation or formatting.
    ///
    /// Decoding can continue after this.
    Invalid(WalkError),

    /// The object is exhausted
    EndOfSource,
}

impl Decoded {
    /// Check if this is the end of the object.
    pub fn is_end(&self) -> bool {
        matches!(self, Decoded::EndOfSource)
    }
}

/// Splits one object's stream into JSON records.
///
/// Records are separated by `\n`; surrounding whitespace (including `\r`) is
/// trimmed and whitespace-only lines are skipped. A final line without a
/// terminator is still a record. Record indexes count the records produced,
/// starting at zero, whether or not they later turn out to be invalid.
pub struct JsonlDecoder {
    object: String,
    reader: Pin<Box<dyn AsyncBufRead + Send>>,
    compression: Compression,
    validate: bool,
    format: Option<FormatStyle>,
    line: Vec<u8>,
    next_index: u64,
    bytes_read: u64,
    finished: bool,
}

impl JsonlDecoder {
    /// Create a decoder over an opened object.
    pub fn new(object: impl Into<String>, reader: ObjectReader, config: &DecoderConfig) -> Self {
        let capacity = config.buffer_size.max(1);
        let reader: Pin<Box<dyn AsyncBufRead + Send>> = match config.compression {
            Compression::None => reader,
            Compression::Bzip2 => {
                let mut decoder = BzDecoder::new(reader);
                decoder.multiple_members(true);
                Box::pin(BufReader::with_capacity(capacity, decoder))
            }
            Compression::Gzip => {
                let mut decoder = GzipDecoder::new(reader);
                decoder.multiple_members(true);
                Box::pin(BufReader::with_capacity(capacity, decoder))
            }
            Compression::Zstd => {
                let mut decoder = ZstdDecoder::new(reader);
                decoder.multiple_members(true);
                Box::pin(BufReader::with_capacity(capacity, decoder))
            }
        };

        Self {
            object: object.into(),
            reader,
            compression: config.compression,
            validate: config.validate,
            format: config.format,
            line: Vec::new(),
            next_index: 0,
            bytes_read: 0,
            finished: false,
        }
    }

    /// Name of the object being decoded.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Decompressed bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Records produced so far, valid or not.
    pub fn records_produced(&self) -> u64 {
        self.next_index
    }

    /// Decode the next item.
    ///
    /// Returns `Err` only when the stream itself fails (I/O or
    /// decompression); the decoder is exhausted afterwards. Once
    /// [`Decoded::EndOfSource`] has been returned it is returned forever.
    pub async fn next_record(&mut self) -> Result<Decoded> {
        loop {
            if self.finished {
                return Ok(Decoded::EndOfSource);
            }

            self.line.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line).await {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Err(self.stream_error(e));
                }
            };

            if read == 0 {
                self.finished = true;
                trace!(
                    object = %self.object,
                    records = self.next_index,
                    bytes = self.bytes_read,
                    "Reached end of object"
                );
                return Ok(Decoded::EndOfSource);
            }
            self.bytes_read += read as u64;

            let trimmed = trim_whitespace(&self.line);
            if trimmed.is_empty() {
                continue;
            }
            let body = Bytes::copy_from_slice(trimmed);

            let index = self.next_index;
            self.next_index += 1;

            return Ok(self.finish(body, index));
        }
    }

    fn finish(&self, body: Bytes, index: u64) -> Decoded {
        if let Some(style) = self.format {
            let value: serde_json::Value = match serde_json::from_slice(&body) {
                Ok(value) => value,
                Err(e) => return Decoded::Invalid(self.invalid_json(index, e)),
            };
            return match format::serialize(&value, style) {
                Ok(formatted) => {
                    Decoded::Record(WalkRecord::new(formatted, self.object.clone(), index))
                }
                Err(e) => Decoded::Invalid(
                    DecodeError::Format {
                        object: self.object.clone(),
                        index,
                        message: e.to_string(),
                    }
                    .into(),
                ),
            };
        }

        if self.validate {
            if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
                return Decoded::Invalid(self.invalid_json(index, e));
            }
        }

        Decoded::Record(WalkRecord::new(body, self.object.clone(), index))
    }

    fn invalid_json(&self, index: u64, error: serde_json::Error) -> WalkError {
        DecodeError::InvalidJson {
            object: self.object.clone(),
            index,
            message: error.to_string(),
        }
        .into()
    }

    fn stream_error(&self, error: std::io::Error) -> WalkError {
        let corrupt = matches!(error.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof);
        if self.compression != Compression::None && corrupt {
            DecodeError::Decompression {
                object: self.object.clone(),
                message: error.to_string(),
            }
            .into()
        } else {
            DecodeError::Io {
                object: self.object.clone(),
                message: error.to_string(),
            }
            .into()
        }
    }
}

fn trim_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}
