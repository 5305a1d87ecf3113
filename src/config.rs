use crate::events::KeySym;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub window: WindowConfig,
    pub dispatch: DispatchConfig,
    pub keep_alive: KeepAliveConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// "auto" or an explicit /dev/input path
    pub device_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub class_name: String,
    /// Title of the window that acts as the control surface. When unset, the window
    /// focused at startup is used.
    pub control_window_name: Option<String>,
    pub left_to_right: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub symbol_release_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeepAliveConfig {
    pub key: Option<String>,
    pub interval_secs: u64,
    pub press_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { device_path: "auto".to_string() }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            class_name: "Toontown Rewritten".to_string(),
            control_window_name: None,
            left_to_right: false,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            debounce_ms: 50,
            symbol_release_delay_ms: 10,
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            key: None,
            interval_secs: 30,
            press_ms: 50,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if present), then `MULTITOON_*` variables
    /// (`MULTITOON_DISPATCH__DEBOUNCE_MS=80`).
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MULTITOON_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("input.device_path must be \"auto\" or a device path");
        }

        if self.window.class_name.trim().is_empty() {
            anyhow::bail!("window.class_name cannot be empty");
        }

        if self.dispatch.poll_interval_ms == 0 {
            anyhow::bail!("dispatch.poll_interval_ms must be greater than 0");
        }
        if self.dispatch.debounce_ms == 0 {
            anyhow::bail!("dispatch.debounce_ms must be greater than 0");
        }

        if !(5..=600).contains(&self.keep_alive.interval_secs) {
            anyhow::bail!(
                "keep_alive.interval_secs must be between 5 and 600, got {}",
                self.keep_alive.interval_secs
            );
        }
        if self.keep_alive.press_ms == 0 {
            anyhow::bail!("keep_alive.press_ms must be greater than 0");
        }
        if let Some(key) = self.keep_alive.key.as_deref().filter(|k| !k.is_empty()) {
            if KeySym::parse(key).is_none() {
                anyhow::bail!("keep_alive.key '{}' is not a known key", key);
            }
        }

        Ok(())
    }

    /// Directory holding settings.json and presets.json
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.directory {
            return Ok(dir.clone());
        }
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("toontown_multitool"))
    }
}
