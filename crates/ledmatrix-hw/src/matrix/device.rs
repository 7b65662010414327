//! Drawing operations on one LED matrix.

use std::sync::Arc;
use tracing::{error, trace};

use super::glyph::{Glyph, GlyphTable};
use super::pack::{self, PixelBuffer};
use super::protocol::{Command, FirmwareVersion, Pattern, PwmFrequency};
use crate::preset::{DeviceConfig, Preset, PresetRegistry};
use crate::usb::{Response, Session};
use crate::{Error, Result};

/// Highest value accepted by the percentage pattern.
const PERCENTAGE_MAX: u8 = 100;

/// LED matrix device controller.
///
/// Owns the claimed session. Brightness and animation state are cached from
/// the last set or successful query; the device remains the source of truth.
pub struct LedMatrix {
    session: Session,
    glyphs: Arc<GlyphTable>,
    brightness: Option<u8>,
    animate: Option<bool>,
    fps: u32,
    preset: Option<Box<dyn Preset>>,
}

impl LedMatrix {
    /// Wraps a claimed session.
    pub fn new(session: Session, glyphs: Arc<GlyphTable>) -> Self {
        Self {
            session,
            glyphs,
            brightness: None,
            animate: None,
            fps: DeviceConfig::default().fps,
            preset: None,
        }
    }

    /// Identity assigned at enumeration.
    pub fn id(&self) -> u32 {
        self.session.id()
    }

    /// Sends a command. Transport failures are already logged by the
    /// session and are not fatal to the caller.
    fn dispatch(&mut self, command: Command, parameters: &[u8]) {
        let _ = self.session.send(command, parameters);
    }

    fn query(&mut self, command: Command) -> Response {
        self.session.send_with_response(command, &[])
    }

    /// Sets the global brightness.
    pub fn set_brightness(&mut self, value: u8) {
        trace!("Setting global brightness to {}", value);
        self.dispatch(Command::Brightness, &[value]);
        self.brightness = Some(value);
    }

    /// Queries the global brightness. No response reads as 0.
    pub fn get_brightness(&mut self) -> u8 {
        trace!("Getting current global brightness");
        match self.query(Command::Brightness).first_byte() {
            Some(value) => {
                self.brightness = Some(value);
                value
            }
            None => 0,
        }
    }

    /// Last brightness set or read, if any.
    pub fn cached_brightness(&self) -> Option<u8> {
        self.brightness
    }

    /// Starts or stops the firmware scrolling the current image.
    pub fn set_animate(&mut self, animate: bool) {
        trace!("Setting integrated animate to {}", animate);
        self.dispatch(Command::Animate, &[animate as u8]);
        self.animate = Some(animate);
    }

    /// Queries the animation state. No response reads as false.
    pub fn get_animate(&mut self) -> bool {
        trace!("Getting current animation status");
        match self.query(Command::Animate).first_byte() {
            Some(value) => {
                let animate = value == 0x01;
                self.animate = Some(animate);
                animate
            }
            None => false,
        }
    }

    /// Last animation state set or read, if any.
    pub fn cached_animate(&self) -> Option<bool> {
        self.animate
    }

    /// Puts the matrix to sleep or wakes it.
    pub fn set_sleep(&mut self, sleep: bool) {
        trace!("Setting sleep to {}", sleep);
        self.dispatch(Command::Sleep, &[sleep as u8]);
    }

    /// Queries the sleep state. No response reads as awake.
    pub fn get_sleep(&mut self) -> bool {
        trace!("Getting current sleep status");
        self.query(Command::Sleep).first_byte() == Some(0x01)
    }

    /// Selects a built-in pattern.
    ///
    /// [`Pattern::Percentage`] needs a value in 0-100; other patterns ignore
    /// `value`.
    pub fn select_pattern(&mut self, pattern: Pattern, value: Option<u8>) -> Result<()> {
        trace!("Setting integrated pattern to {}", pattern);
        match pattern {
            Pattern::Percentage => {
                let value = value.ok_or_else(|| {
                    Error::InvalidSetting("percentage pattern requires a value".to_string())
                })?;
                if value > PERCENTAGE_MAX {
                    error!("Value must be between 0 and {}", PERCENTAGE_MAX);
                    return Err(Error::OutOfRange {
                        what: "Percentage",
                        value: value as i64,
                        max: PERCENTAGE_MAX as i64,
                    });
                }
                self.dispatch(Command::Pattern, &[pattern as u8, value]);
            }
            _ => self.dispatch(Command::Pattern, &[pattern as u8]),
        }
        Ok(())
    }

    /// Fills a percentage of the matrix from the bottom.
    pub fn pattern_percentage(&mut self, value: u8) -> Result<()> {
        self.select_pattern(Pattern::Percentage, Some(value))
    }

    /// Writes up to five characters, one glyph per codepoint.
    ///
    /// Combining marks are not clustered and characters without a glyph
    /// (lowercase letters among them) show as `?`.
    pub fn draw_text(&mut self, text: &str) {
        trace!("Setting text to {}", text);
        let mut buf = [0u8; 4];
        let glyphs: Vec<Glyph> = text
            .chars()
            .take(pack::MAX_GLYPHS)
            .map(|c| self.glyphs.lookup(c.encode_utf8(&mut buf)))
            .collect();
        self.draw_glyphs(&glyphs);
    }

    /// Writes up to five symbols by identifier, e.g. `["sun", "2", "degC"]`.
    pub fn draw_symbols<S: AsRef<str>>(&mut self, symbols: &[S]) {
        let glyphs: Vec<Glyph> = symbols
            .iter()
            .take(pack::MAX_GLYPHS)
            .map(|symbol| self.glyphs.lookup(symbol.as_ref()))
            .collect();
        self.draw_glyphs(&glyphs);
    }

    fn draw_glyphs(&mut self, glyphs: &[Glyph]) {
        let payload = pack::pack_glyphs(glyphs);
        self.dispatch(Command::Draw, &payload);
    }

    /// Lights the first `count` pixels, 0 to 306.
    pub fn draw_count(&mut self, count: i64) -> Result<()> {
        trace!("Setting pattern to count {}", count);
        let payload = pack::pack_count(count).map_err(|e| {
            error!("{}", e);
            e
        })?;
        self.dispatch(Command::Draw, &payload);
        Ok(())
    }

    /// Shows a black/white image in a single command.
    pub fn draw_matrix(&mut self, buffer: &PixelBuffer) {
        trace!(
            "Setting pattern to matrix with {} lit pixels",
            buffer.lit_count()
        );
        let payload = pack::pack_matrix(buffer);
        self.dispatch(Command::Draw, &payload);
    }

    /// Shows up to nine bars growing up and down from the middle row.
    pub fn draw_equalizer(&mut self, values: &[u8]) -> Result<()> {
        trace!("Setting pattern to equalizer with {} values", values.len());
        let buffer = pack::equalizer(values).map_err(|e| {
            error!("{}", e);
            e
        })?;
        self.draw_matrix(&buffer);
        Ok(())
    }

    /// Queries the PWM frequency. `None` when unknown or unanswered.
    pub fn get_pwm_frequency(&mut self) -> Option<PwmFrequency> {
        self.query(Command::PwmFreq)
            .first_byte()
            .and_then(PwmFrequency::from_code)
    }

    /// Sets the PWM frequency.
    pub fn set_pwm_frequency(&mut self, frequency: PwmFrequency) {
        trace!("Setting PWM frequency to {}", frequency);
        self.dispatch(Command::PwmFreq, &[frequency.code()]);
    }

    /// Queries the firmware version.
    pub fn get_firmware_version(&mut self) -> Option<FirmwareVersion> {
        self.query(Command::Version)
            .bytes()
            .and_then(FirmwareVersion::decode)
    }

    /// Frames per second the host should render this device at.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Applies brightness, fps and preset from a per-device configuration.
    pub fn apply_config(&mut self, config: &DeviceConfig, presets: &PresetRegistry) -> Result<()> {
        crate::preset::apply_config(self, config, presets)
    }

    pub(crate) fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
    }

    pub(crate) fn take_preset(&mut self) -> Option<Box<dyn Preset>> {
        self.preset.take()
    }

    pub(crate) fn install_preset(&mut self, preset: Box<dyn Preset>) {
        self.preset = Some(preset);
    }

    /// Id of the active preset, if any.
    pub fn active_preset(&self) -> Option<&str> {
        self.preset.as_deref().map(|p| p.id())
    }

    /// Runs one frame of the active preset. Does nothing without a preset.
    pub fn render(&mut self) {
        if let Some(mut preset) = self.preset.take() {
            preset.render(self);
            self.preset = Some(preset);
        }
    }

    /// Stops the active preset and releases the device.
    pub fn teardown(mut self) {
        if let Some(mut preset) = self.preset.take() {
            preset.exit(&mut self);
        }
        let LedMatrix { session, .. } = self;
        session.teardown();
    }
}

impl std::fmt::Debug for LedMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedMatrix")
            .field("session", &self.session)
            .field("brightness", &self.brightness)
            .field("animate", &self.animate)
            .field("fps", &self.fps)
            .field("preset", &self.active_preset())
            .finish()
    }
}
