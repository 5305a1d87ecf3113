//! Small JSON stores kept in the per-user config directory.

pub mod presets;
pub mod settings;

pub use presets::{Preset, PresetStore};
pub use settings::{format_delay_label, parse_delay_label, SettingsStore};
