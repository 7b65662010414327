//! Configuration management.

use anyhow::{Context, Result};
use ledmatrix_hw::DeviceConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Settings applied to every device without an override
    #[serde(default)]
    pub defaults: DeviceConfig,

    /// Per-device overrides, keyed by device id
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceOverride>,
}

/// Settings that replace the defaults for one device.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceOverride {
    #[serde(default)]
    pub brightness: Option<u8>,

    #[serde(default)]
    pub preset: Option<String>,

    #[serde(default)]
    pub fps: Option<u32>,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Loads configuration, falling back to the defaults when the file does
    /// not exist. A file that exists but does not parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Effective settings for a device.
    pub fn config_for(&self, id: u32) -> DeviceConfig {
        let mut config = self.defaults.clone();
        if let Some(device) = self.devices.get(&id.to_string()) {
            if let Some(brightness) = device.brightness {
                config.brightness = brightness;
            }
            if let Some(preset) = &device.preset {
                config.preset = preset.clone();
            }
            if let Some(fps) = device.fps {
                config.fps = fps;
            }
        }
        config
    }
}
