use crate::error::Result;
use crate::events::{KeyAction, KeySym, WindowHandle};
use std::sync::Arc;

/// Synthetic key and text injection into a single window
#[async_trait::async_trait]
pub trait InputInjector: Send + Sync {
    async fn send_key(&self, window: WindowHandle, key: KeySym, action: KeyAction) -> Result<()>;

    async fn send_text(&self, window: WindowHandle, text: &str) -> Result<()>;

    /// Press and release in one step.
    async fn send_tap(&self, window: WindowHandle, key: KeySym) -> Result<()> {
        self.send_key(window, key, KeyAction::Down).await?;
        self.send_key(window, key, KeyAction::Up).await
    }

    /// Whether text injection leaves a synthetic shift pressed on the window,
    /// which the caller must release right after typing.
    fn text_leaves_shift_down(&self) -> bool {
        false
    }
}

/// Factory function to create the injection backend based on the dry_run flag
pub fn create_injector(dry_run: bool) -> Arc<dyn InputInjector> {
    if dry_run {
        Arc::new(super::dry_run::DryRunInjector::new())
    } else {
        Arc::new(super::xdotool::XdotoolInjector::new())
    }
}
