use super::r#trait::KeyboardListenerTrait;
use super::tracker::KeyTracker;
use crate::error::Result;
use tracing::{debug, info};

/// Listener that holds no device and never reports a key.
pub struct DryRunKeyboardListener {
    _tracker: KeyTracker,
}

impl DryRunKeyboardListener {
    pub fn new(tracker: KeyTracker) -> Self {
        info!("Dry-run mode - no keyboard device is read");
        Self { _tracker: tracker }
    }

    async fn run_impl(self) -> Result<()> {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
            debug!("Keyboard listener idle (dry-run)");
        }
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
