//! Presets and per-device configuration.
//!
//! A preset is a plugin that draws on a matrix through the public drawing
//! operations. The host registers preset types once and every device gets
//! its own fresh instance when a configuration selects it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::matrix::LedMatrix;
use crate::{Error, Result};

/// Preset id meaning "leave the matrix alone".
pub const NO_PRESET: &str = "none";

/// Lowest and highest render rate a device may be configured with.
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 1..=60;

/// Trait for all presets.
pub trait Preset: Send {
    /// Returns the stable identifier used in configuration.
    fn id(&self) -> &str;

    /// Returns the display name.
    fn name(&self) -> &str;

    /// Called once when the preset becomes active on a device.
    fn init(&mut self, _matrix: &mut LedMatrix) {}

    /// Called on every scheduler tick.
    fn render(&mut self, matrix: &mut LedMatrix);

    /// Called once when the preset is replaced or the device is released.
    fn exit(&mut self, _matrix: &mut LedMatrix) {}
}

type Factory = fn() -> Box<dyn Preset>;

fn create<P: Preset + Default + 'static>() -> Box<dyn Preset> {
    Box::new(P::default())
}

struct Entry {
    name: String,
    factory: Factory,
}

/// Registered preset types, keyed by id.
#[derive(Default)]
pub struct PresetRegistry {
    entries: BTreeMap<String, Entry>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a preset type. A later registration with the same id wins.
    pub fn register<P: Preset + Default + 'static>(&mut self) -> &mut Self {
        let sample = P::default();
        debug!("Registering preset {} ({})", sample.id(), sample.name());
        self.entries.insert(
            sample.id().to_string(),
            Entry {
                name: sample.name().to_string(),
                factory: create::<P>,
            },
        );
        self
    }

    /// Builds a fresh instance of the preset with this id.
    pub fn create(&self, id: &str) -> Option<Box<dyn Preset>> {
        self.entries.get(id).map(|entry| (entry.factory)())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Lists `(id, name)` pairs in id order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.name.as_str()))
            .collect()
    }
}

/// Settings the host keeps for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Global brightness (0-255).
    #[serde(default = "default_brightness")]
    pub brightness: u8,

    /// Preset id, or "none".
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Render rate (1-60).
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_brightness() -> u8 {
    150
}

fn default_preset() -> String {
    NO_PRESET.to_string()
}

fn default_fps() -> u32 {
    24
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            brightness: default_brightness(),
            preset: default_preset(),
            fps: default_fps(),
        }
    }
}

impl DeviceConfig {
    /// Render rate clamped to [`FPS_RANGE`].
    pub fn clamped_fps(&self) -> u32 {
        self.fps.clamp(*FPS_RANGE.start(), *FPS_RANGE.end())
    }
}

/// Applies a configuration to a device.
///
/// Exits the active preset, sends the brightness, records the render rate,
/// then starts a fresh instance of the configured preset. An unknown preset
/// id leaves the device without a preset and is returned as an error.
pub fn apply_config(
    matrix: &mut LedMatrix,
    config: &DeviceConfig,
    presets: &PresetRegistry,
) -> Result<()> {
    if let Some(mut active) = matrix.take_preset() {
        debug!("Exiting preset {} on device {}", active.id(), matrix.id());
        active.exit(matrix);
    }

    matrix.set_brightness(config.brightness);
    matrix.set_fps(config.clamped_fps());

    if config.preset == NO_PRESET {
        return Ok(());
    }

    let mut preset = presets.create(&config.preset).ok_or_else(|| {
        error!("Preset {} not found", config.preset);
        Error::UnknownPreset(config.preset.clone())
    })?;

    debug!("Starting preset {} on device {}", preset.id(), matrix.id());
    preset.init(matrix);
    matrix.install_preset(preset);
    Ok(())
}
