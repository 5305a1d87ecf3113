use crate::error::{MultitoonError, Result};
use crate::events::{ControlScheme, TOON_SLOTS};
use crate::storage::settings::write_json;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const PRESET_SLOTS: u8 = 5;

/// Snapshot of the toon layout that can be restored later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub enabled_toons: [bool; TOON_SLOTS],
    pub movement_modes: [ControlScheme; TOON_SLOTS],
    pub service_running: bool,
}

/// On-disk form, read leniently: short lists and unknown schemes fall back per entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredPreset {
    enabled_toons: Vec<Value>,
    movement_modes: Vec<Value>,
    service_running: bool,
}

impl Preset {
    fn from_stored(index: u8, stored: StoredPreset) -> Self {
        let mut preset = Preset {
            service_running: stored.service_running,
            ..Preset::default()
        };
        for (slot, value) in stored.enabled_toons.iter().take(TOON_SLOTS).enumerate() {
            match value.as_bool() {
                Some(enabled) => preset.enabled_toons[slot] = enabled,
                None => warn!("Preset {}: toon {} enable flag {} ignored", index, slot + 1, value),
            }
        }
        for (slot, value) in stored.movement_modes.iter().take(TOON_SLOTS).enumerate() {
            match value.as_str().and_then(|s| s.parse::<ControlScheme>().ok()) {
                Some(scheme) => preset.movement_modes[slot] = scheme,
                None => warn!("Preset {}: toon {} movement mode {} ignored", index, slot + 1, value),
            }
        }
        preset
    }
}

/// Presets 1..=5 persisted together in `presets.json`.
pub struct PresetStore {
    path: PathBuf,
    presets: Mutex<Map<String, Value>>,
}

impl PresetStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("presets.json");
        let presets = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Map<String, Value>>(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable presets file {}: {}", path.display(), e);
                Map::new()
            }),
            Err(e) => {
                debug!("No presets file at {} ({})", path.display(), e);
                Map::new()
            }
        };
        Self { path, presets: Mutex::new(presets) }
    }

    fn check_index(index: u8) -> Result<()> {
        if (1..=PRESET_SLOTS).contains(&index) {
            Ok(())
        } else {
            Err(MultitoonError::InvalidPreset(index))
        }
    }

    pub fn save(&self, index: u8, preset: &Preset) -> Result<()> {
        Self::check_index(index)?;
        let mut presets = self.presets.lock();
        presets.insert(index.to_string(), serde_json::to_value(preset)?);
        write_json(&self.path, &Value::Object(presets.clone()))?;
        info!("Preset {} saved to {}", index, self.path.display());
        Ok(())
    }

    /// `Ok(None)` when nothing was saved under `index`.
    pub fn load(&self, index: u8) -> Result<Option<Preset>> {
        Self::check_index(index)?;
        let presets = self.presets.lock();
        let Some(value) = presets.get(&index.to_string()) else {
            return Ok(None);
        };
        let stored = match StoredPreset::deserialize(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Preset {} is malformed ({}), loading defaults", index, e);
                StoredPreset::default()
            }
        };
        Ok(Some(Preset::from_stored(index, stored)))
    }
}
