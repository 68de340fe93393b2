//! Decoder configuration.

use bw_error::{Result, WalkError};
use bw_types::{Compression, FormatStyle};
use serde::{Deserialize, Serialize};

/// Default read buffer size (64KB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration shared by every decoder of a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Compression applied to every object
    pub compression: Compression,

    /// Reject records that are not valid JSON
    pub validate: bool,

    /// Re-serialize records in canonical form.
    ///
    /// Formatting parses every record, so it implies validation.
    pub format: Option<FormatStyle>,

    /// Buffer size for the decompressed stream
    pub buffer_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            validate: false,
            format: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Enable or disable strict JSON validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Re-format records in the given style.
    pub fn with_format(mut self, style: FormatStyle) -> Self {
        self.format = Some(style);
        self
    }

    /// Set the buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(WalkError::Config(
                "decoder buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
