use super::r#trait::InputInjector;
use crate::error::{MultitoonError, Result};
use crate::events::{KeyAction, KeySym, WindowHandle};
use crate::services::xdotool;
use tracing::debug;

pub struct XdotoolInjector;

impl XdotoolInjector {
    pub fn new() -> Self {
        Self
    }

    async fn run_for(&self, window: WindowHandle, args: &[&str]) -> Result<()> {
        let output = xdotool::run(args).await?;
        if output.success {
            Ok(())
        } else {
            Err(MultitoonError::injection(
                window,
                format!("xdotool {} exited with error: {}", args.join(" "), output.stderr),
            ))
        }
    }
}

#[async_trait::async_trait]
impl InputInjector for XdotoolInjector {
    async fn send_key(&self, window: WindowHandle, key: KeySym, action: KeyAction) -> Result<()> {
        let id = window.to_string();
        debug!("xdotool {} --window {} {}", action.xdotool_command(), id, key);
        self.run_for(window, &[action.xdotool_command(), "--window", &id, key.as_str()]).await
    }

    async fn send_text(&self, window: WindowHandle, text: &str) -> Result<()> {
        let id = window.to_string();
        debug!("xdotool type --window {} {}", id, text);
        self.run_for(window, &["type", "--window", &id, text]).await
    }

    async fn send_tap(&self, window: WindowHandle, key: KeySym) -> Result<()> {
        let id = window.to_string();
        debug!("xdotool key --window {} {}", id, key);
        self.run_for(window, &["key", "--window", &id, key.as_str()]).await
    }

    // `xdotool type` presses shift for shifted characters and may leave it down on the window
    fn text_leaves_shift_down(&self) -> bool {
        true
    }
}
