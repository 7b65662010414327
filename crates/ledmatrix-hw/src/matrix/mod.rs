//! LED matrix module.
//!
//! Provides drawing on the 9x34 monochrome matrix: glyphs, bit packing and
//! command framing.

mod device;

pub mod glyph;
pub mod pack;
pub mod protocol;

pub use device::LedMatrix;
pub use glyph::{Glyph, GlyphTable};
pub use pack::PixelBuffer;
pub use protocol::{Command, FirmwareVersion, Pattern, PwmFrequency};
