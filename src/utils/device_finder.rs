use crate::error::{MultitoonError, Result};
use evdev::KeyCode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BY_ID_DIR: &str = "/dev/input/by-id";
const INPUT_DIR: &str = "/dev/input";

pub struct DeviceFinder;

impl DeviceFinder {
    /// Resolve the keyboard to listen on: an explicit path, or "auto" for discovery.
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Using configured keyboard device {:?}", path);
                Ok(path)
            } else {
                MultitoonError::device_not_found(format!("Configured device does not exist: {:?}", path))
            };
        }

        info!("Looking for a keyboard device...");

        if let Ok(device) = Self::find_by_id() {
            info!("Found keyboard by id: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Found keyboard among event devices: {:?}", device);
            return Ok(device);
        }

        MultitoonError::device_not_found(
            "No readable keyboard device found. Make sure the user is in the 'input' group",
        )
    }

    /// Ranking of a /dev/input/by-id entry name; `None` when it is not a keyboard candidate.
    fn by_id_priority(name: &str) -> Option<u32> {
        let lower = name.to_lowercase();
        if !lower.contains("event") || lower.contains("mouse") {
            return None;
        }
        if lower.ends_with("event-kbd") {
            Some(100)
        } else if lower.contains("keyboard") {
            Some(50)
        } else if lower.contains("kbd") {
            Some(10)
        } else {
            None
        }
    }

    fn find_by_id() -> Result<PathBuf> {
        let entries = fs::read_dir(BY_ID_DIR)
            .map_err(|e| MultitoonError::Permission(format!("Cannot read {}: {}", BY_ID_DIR, e)))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            let Some(priority) = Self::by_id_priority(name) else {
                continue;
            };
            if !Self::is_device_accessible(&path) {
                warn!("Keyboard candidate {:?} is not readable", path);
                continue;
            }
            if Self::is_keyboard_device(&path) {
                debug!("Keyboard candidate {} (priority {})", name, priority);
                candidates.push((path, priority));
            }
        }

        // highest priority first; ties keep directory order
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates
            .into_iter()
            .next()
            .map(|(path, _)| path)
            .ok_or_else(|| MultitoonError::DeviceNotFound(format!("No keyboard in {}", BY_ID_DIR)))
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let entries = fs::read_dir(INPUT_DIR)
            .map_err(|e| MultitoonError::Permission(format!("Cannot read {}: {}", INPUT_DIR, e)))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with("event")) {
                event_devices.push(path);
            }
        }
        event_devices.sort();

        event_devices
            .into_iter()
            .find(|path| Self::is_device_accessible(path) && Self::is_keyboard_device(path))
            .ok_or_else(|| MultitoonError::DeviceNotFound(format!("No keyboard among {} event devices", INPUT_DIR)))
    }

    fn is_keyboard_device(device_path: &Path) -> bool {
        match evdev::Device::open(device_path) {
            Ok(device) => {
                let device_name = device.name().unwrap_or("Unknown").to_lowercase();
                if device_name.contains("mouse") || device_name.contains("touchpad") {
                    return false;
                }

                // A real keyboard reports letters, space, enter and plenty of other keys
                device.supported_keys().is_some_and(|keys| {
                    keys.contains(KeyCode::KEY_A)
                        && keys.contains(KeyCode::KEY_W)
                        && keys.contains(KeyCode::KEY_SPACE)
                        && keys.contains(KeyCode::KEY_ENTER)
                        && keys.iter().count() > 20
                })
            }
            Err(e) => {
                debug!("Cannot open {:?}: {}", device_path, e);
                false
            }
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        fs::File::open(device_path).is_ok()
    }
}
