//! LED matrix protocol definitions and framing.
//!
//! Frame structure:
//! - Magic: 2 bytes, 0x32 0xAC
//! - Command: 1 byte
//! - Parameters: 0..N bytes, command specific
//!
//! Responses are read from the IN endpoint into a 32-byte buffer and
//! truncated to the number of bytes the firmware actually sent.

use crate::{Error, Result};
use std::str::FromStr;

/// Magic header identifying a command frame.
pub const MAGIC: [u8; 2] = [0x32, 0xAC];

/// Maximum response size read from the IN endpoint.
pub const RESPONSE_SIZE: usize = 32;

/// Size of a packed 9x34 pixel payload (312 bits).
pub const DRAW_PAYLOAD_SIZE: usize = 39;

/// Command codes understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Brightness = 0x00,
    Pattern = 0x01,
    BootloaderReset = 0x02,
    Sleep = 0x03,
    Animate = 0x04,
    Panic = 0x05,
    Draw = 0x06,
    StageGreyCol = 0x07,
    DrawGreyColBuffer = 0x08,
    SetText = 0x09,
    StartGame = 0x10,
    GameControl = 0x11,
    GameStatus = 0x12,
    SetColor = 0x13,
    DisplayOn = 0x14,
    InvertScreen = 0x15,
    SetPixelColumn = 0x16,
    FlushFramebuffer = 0x17,
    ClearRam = 0x18,
    ScreenSaver = 0x19,
    SetFps = 0x1A,
    SetPowerMode = 0x1B,
    PwmFreq = 0x1E,
    DebugMode = 0x1F,
    Version = 0x20,
}

/// Patterns built into the firmware, selected with [`Command::Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Pattern {
    /// Fills a percentage of the matrix from the bottom. Takes a 0-100 value.
    Percentage = 0x00,
    /// Top to bottom gradient, 0% to 13% brightness.
    Gradient = 0x01,
    /// Gradient peaking at 7% in the middle row.
    DoubleGradient = 0x02,
    /// "LOTUS" written sideways.
    DisplayLotus = 0x03,
    ZigZag = 0x04,
    /// Every pixel at maximum brightness.
    FullBrightness = 0x05,
    /// "PANIC" written on the matrix.
    DisplayPanic = 0x06,
    /// "LOTUS" written top to bottom.
    DisplayLotus2 = 0x07,
}

impl Pattern {
    /// All built-in patterns in code order.
    pub const ALL: [Pattern; 8] = [
        Pattern::Percentage,
        Pattern::Gradient,
        Pattern::DoubleGradient,
        Pattern::DisplayLotus,
        Pattern::ZigZag,
        Pattern::FullBrightness,
        Pattern::DisplayPanic,
        Pattern::DisplayLotus2,
    ];
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "percentage" => Ok(Pattern::Percentage),
            "gradient" => Ok(Pattern::Gradient),
            "double-gradient" | "double_gradient" => Ok(Pattern::DoubleGradient),
            "lotus" | "lotus-sideways" => Ok(Pattern::DisplayLotus),
            "zigzag" | "zig-zag" => Ok(Pattern::ZigZag),
            "full-brightness" | "full_brightness" | "full" => Ok(Pattern::FullBrightness),
            "panic" => Ok(Pattern::DisplayPanic),
            "lotus2" | "lotus-top-down" => Ok(Pattern::DisplayLotus2),
            _ => Err(Error::UnknownPattern(s.to_string())),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Percentage => write!(f, "percentage"),
            Pattern::Gradient => write!(f, "gradient"),
            Pattern::DoubleGradient => write!(f, "double-gradient"),
            Pattern::DisplayLotus => write!(f, "lotus"),
            Pattern::ZigZag => write!(f, "zigzag"),
            Pattern::FullBrightness => write!(f, "full-brightness"),
            Pattern::DisplayPanic => write!(f, "panic"),
            Pattern::DisplayLotus2 => write!(f, "lotus2"),
        }
    }
}

/// PWM frequencies the firmware can drive the LEDs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmFrequency {
    Hz29000,
    Hz3600,
    Hz1800,
    Hz900,
}

impl PwmFrequency {
    /// Decodes the single-byte code returned by a [`Command::PwmFreq`] query.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PwmFrequency::Hz29000),
            1 => Some(PwmFrequency::Hz3600),
            2 => Some(PwmFrequency::Hz1800),
            3 => Some(PwmFrequency::Hz900),
            _ => None,
        }
    }

    /// Maps a frequency in Hz back to its enum value.
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            29000 => Some(PwmFrequency::Hz29000),
            3600 => Some(PwmFrequency::Hz3600),
            1800 => Some(PwmFrequency::Hz1800),
            900 => Some(PwmFrequency::Hz900),
            _ => None,
        }
    }

    /// Returns the wire code.
    pub fn code(&self) -> u8 {
        match self {
            PwmFrequency::Hz29000 => 0,
            PwmFrequency::Hz3600 => 1,
            PwmFrequency::Hz1800 => 2,
            PwmFrequency::Hz900 => 3,
        }
    }

    /// Returns the frequency in Hz.
    pub fn hz(&self) -> u32 {
        match self {
            PwmFrequency::Hz29000 => 29000,
            PwmFrequency::Hz3600 => 3600,
            PwmFrequency::Hz1800 => 1800,
            PwmFrequency::Hz900 => 900,
        }
    }
}

impl std::fmt::Display for PwmFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// Firmware version reported by [`Command::Version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub pre_release: bool,
}

impl FirmwareVersion {
    /// Decodes a version response. Needs at least three bytes.
    pub fn decode(response: &[u8]) -> Option<Self> {
        match response {
            [major, minor_patch, pre, ..] => Some(Self {
                major: *major,
                minor: minor_patch >> 4,
                patch: minor_patch & 0x0F,
                pre_release: *pre == 1,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.pre_release {
            write!(f, " (pre-release)")?;
        }
        Ok(())
    }
}

/// Builds a wire frame: magic, command byte, then the parameters verbatim.
pub fn frame(command: Command, parameters: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(MAGIC.len() + 1 + parameters.len());
    buffer.extend_from_slice(&MAGIC);
    buffer.push(command as u8);
    buffer.extend_from_slice(parameters);
    buffer
}
