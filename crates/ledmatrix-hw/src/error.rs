//! Error types for the LED matrix hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// libusb reported a failure (transfer, claim, configuration, ...).
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// Bulk OUT transfer moved fewer bytes than the frame holds.
    #[error("Bulk OUT transfer size does not match: expected {expected}, got {actual}")]
    ShortWrite { expected: usize, actual: usize },

    /// Caller-supplied numeric parameter outside its documented bounds.
    #[error("{what} must be between 0 and {max}, got {value}")]
    OutOfRange {
        what: &'static str,
        value: i64,
        max: i64,
    },

    /// Unknown built-in pattern name.
    #[error("Invalid pattern: {0}")]
    UnknownPattern(String),

    /// No preset registered under this id.
    #[error("Preset {0} not found")]
    UnknownPreset(String),

    /// A setting could not be parsed.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Glyph table was built without the `?` fallback glyph.
    #[error("Glyph table has no fallback glyph '?'")]
    MissingFallbackGlyph,
}
