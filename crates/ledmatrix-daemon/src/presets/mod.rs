//! Presets shipped with the daemon.

mod clock;

use clock::Clock;
use ledmatrix_hw::PresetRegistry;

/// Builds the registry of every preset the daemon knows.
pub fn registry() -> PresetRegistry {
    let mut registry = PresetRegistry::new();
    registry.register::<Clock>();
    registry
}
