use super::r#trait::InputInjector;
use crate::error::Result;
use crate::events::{KeyAction, KeySym, WindowHandle};
use tracing::info;

pub struct DryRunInjector;

impl DryRunInjector {
    pub fn new() -> Self {
        info!("Dry-run mode - key injection is logged only");
        Self
    }
}

#[async_trait::async_trait]
impl InputInjector for DryRunInjector {
    async fn send_key(&self, window: WindowHandle, key: KeySym, action: KeyAction) -> Result<()> {
        info!("[DRY RUN] {} '{}' -> window {}", action.xdotool_command(), key, window);
        Ok(())
    }

    async fn send_text(&self, window: WindowHandle, text: &str) -> Result<()> {
        info!("[DRY RUN] type '{}' -> window {}", text, window);
        Ok(())
    }
}
