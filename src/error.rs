use crate::events::WindowHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultitoonError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Insufficient permissions: {0}")]
    Permission(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Window discovery failed: {0}")]
    Discovery(String),

    #[error("Injection into window {window} failed: {message}")]
    Injection { window: WindowHandle, message: String },

    #[error("Unknown key: {0}")]
    InvalidKey(String),

    #[error("No keep-alive key set; set one before enabling")]
    NoKeepAliveKey,

    #[error("Preset index {0} is out of range (1-5)")]
    InvalidPreset(u8),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MultitoonError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(MultitoonError::DeviceNotFound(msg.into()))
    }

    pub fn injection(window: WindowHandle, message: impl Into<String>) -> Self {
        MultitoonError::Injection {
            window,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MultitoonError>;

#[macro_export]
macro_rules! multitoon_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::MultitoonError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::MultitoonError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::MultitoonError::ServiceUnavailable(format!($($arg)*))
    };
    (discovery, $($arg:tt)*) => {
        $crate::error::MultitoonError::Discovery(format!($($arg)*))
    };
    (invalid_key, $($arg:tt)*) => {
        $crate::error::MultitoonError::InvalidKey(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::MultitoonError::Internal(format!($($arg)*))
    };
}
