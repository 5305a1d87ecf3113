use crate::error::Result;
use crate::events::{WindowGeometry, WindowHandle};
use std::sync::Arc;

/// Window and geometry queries against the display server.
///
/// Implementations must tolerate handles that no longer exist: a vanished window
/// yields `Ok(None)` from `geometry`, never an error.
#[async_trait::async_trait]
pub trait WindowQuery: Send + Sync {
    /// Windows whose class matches `class_name`, in the order the server reports them
    async fn list_windows(&self, class_name: &str) -> Result<Vec<WindowHandle>>;

    /// Windows whose title matches `name`
    async fn find_by_name(&self, name: &str) -> Result<Vec<WindowHandle>>;

    async fn geometry(&self, handle: WindowHandle) -> Result<Option<WindowGeometry>>;

    async fn focused_window(&self) -> Result<Option<WindowHandle>>;
}

/// Factory function to create the window query backend based on the dry_run flag
pub fn create_window_query(dry_run: bool) -> Arc<dyn WindowQuery> {
    if dry_run {
        Arc::new(super::dry_run::DryRunWindowQuery::new())
    } else {
        Arc::new(super::xdotool::XdotoolWindowQuery::new())
    }
}
