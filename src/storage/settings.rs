use crate::error::Result;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const LEFT_TO_RIGHT: &str = "left_to_right_assignment";
pub const KEEP_ALIVE_KEY: &str = "keep_alive_key";
pub const KEEP_ALIVE_DELAY: &str = "keep_alive_delay";
pub const CONTROL_WINDOW_ID: &str = "multitool_window_id";

const FALLBACK_DELAY: Duration = Duration::from_secs(60);

/// Flat key/value settings persisted to `settings.json` on every write.
/// Keys this program does not know about are kept as they are. Defaults are supplied
/// by the reader (`left_to_right_assignment: false`, `keep_alive_key: ""`,
/// `keep_alive_delay: "30 sec"`).
pub struct SettingsStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl SettingsStore {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("settings.json");
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Map<String, Value>>(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                Map::new()
            }),
            Err(e) => {
                debug!("No settings file at {} ({}), using defaults", path.display(), e);
                Map::new()
            }
        };
        Self { path, values: Mutex::new(values) }
    }

    /// Stored value for `key`, or `default` when absent or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let values = self.values.lock();
        match values.get(key) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                warn!("Setting '{}' has an unexpected value: {}", key, e);
                default
            }),
            None => default,
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), serde_json::to_value(value)?);
        write_json(&self.path, &Value::Object(values.clone()))
    }
}

pub(crate) fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Interval for a keep-alive label such as "30 sec" or "5 min".
/// Labels that do not parse fall back to one minute.
pub fn parse_delay_label(label: &str) -> Duration {
    let mut parts = label.split_whitespace();
    let amount = parts.next().and_then(|n| n.parse::<u64>().ok());
    let unit = parts.next();
    match (amount, unit, parts.next()) {
        (Some(n), Some("sec"), None) => Duration::from_secs(n),
        (Some(n), Some("min"), None) => n.checked_mul(60).map(Duration::from_secs).unwrap_or(FALLBACK_DELAY),
        _ => FALLBACK_DELAY,
    }
}

pub fn format_delay_label(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} sec", secs)
    }
}
