//! LED Matrix Hardware Library
//!
//! Drives 9x34 LED matrix input modules over USB bulk transfers: command
//! framing, pixel packing, the glyph table, and claiming and releasing the
//! device.

pub mod error;
pub mod matrix;
pub mod preset;
pub mod usb;

pub use error::{Error, Result};
pub use matrix::{GlyphTable, LedMatrix, PixelBuffer};
pub use preset::{apply_config, DeviceConfig, Preset, PresetRegistry};
pub use usb::{teardown_all, Response, Session, UsbManager};

/// Matrix dimensions.
pub const MATRIX_WIDTH: usize = matrix::pack::WIDTH;
pub const MATRIX_HEIGHT: usize = matrix::pack::HEIGHT;

/// USB VID:PID for the LED matrix.
pub const MATRIX_VID: u16 = 0x32AC;
pub const MATRIX_PID: u16 = 0x0020;
