use super::r#trait::KeyboardListenerTrait;
use super::tracker::KeyTracker;
use crate::config::Config;
use crate::error::{MultitoonError, Result};
use crate::multitoon_error;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, KeyCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// ENODEV: the device was unplugged
const DEVICE_GONE: i32 = 19;

pub struct RealKeyboardListener {
    device: Device,
    tracker: KeyTracker,
}

impl RealKeyboardListener {
    pub fn new(config: Arc<Config>, tracker: KeyTracker) -> Result<Self> {
        let device_path = DeviceFinder::find_keyboard_device(&config.input.device_path)?;

        // Deliberately not grabbed: the focused application must keep receiving keys
        let device = Device::open(&device_path).map_err(|e| {
            MultitoonError::DeviceNotFound(format!("Cannot open {:?}: {}", device_path, e))
        })?;

        info!(
            "Listening on {} ({})",
            device.name().unwrap_or("Unknown"),
            device_path.display()
        );

        Ok(Self { device, tracker })
    }

    /// Blocking read loop; runs on a dedicated blocking worker.
    fn read_loop(mut self) -> Result<()> {
        loop {
            let events: Vec<_> = match self.device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) if e.raw_os_error() == Some(DEVICE_GONE) => {
                    self.tracker.reset();
                    return Err(multitoon_error!(device_not_found, "Keyboard removed: {}", e));
                }
                Err(e) => {
                    error!("Failed to read keyboard events: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            for event in events {
                if event.event_type() == EventType::KEY {
                    self.tracker.handle(KeyCode::new(event.code()), event.value());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        let listener = *self;
        tokio::task::spawn_blocking(move || listener.read_loop())
            .await
            .map_err(|e| multitoon_error!(internal, "Keyboard reader panicked: {}", e))?
    }
}
