use super::r#trait::WindowQuery;
use crate::error::Result;
use crate::events::{WindowGeometry, WindowHandle};
use tracing::info;

/// Control window handle reported by the dry-run backend; always focused.
const DRY_RUN_CONTROL_WINDOW: WindowHandle = WindowHandle(1);

/// Emulated game windows, deliberately not in left-to-right order
const DRY_RUN_WINDOWS: [(u64, i32); 4] = [(1001, 1920), (1002, 0), (1003, 2880), (1004, 960)];

pub struct DryRunWindowQuery;

impl DryRunWindowQuery {
    pub fn new() -> Self {
        info!("Dry-run mode - window queries are emulated");
        Self
    }
}

#[async_trait::async_trait]
impl WindowQuery for DryRunWindowQuery {
    async fn list_windows(&self, _class_name: &str) -> Result<Vec<WindowHandle>> {
        Ok(DRY_RUN_WINDOWS.iter().map(|&(id, _)| WindowHandle(id)).collect())
    }

    async fn find_by_name(&self, _name: &str) -> Result<Vec<WindowHandle>> {
        Ok(vec![DRY_RUN_CONTROL_WINDOW])
    }

    async fn geometry(&self, handle: WindowHandle) -> Result<Option<WindowGeometry>> {
        Ok(DRY_RUN_WINDOWS
            .iter()
            .find(|&&(id, _)| id == handle.value())
            .map(|&(_, x)| WindowGeometry { x, y: 0, width: 960, height: 720 }))
    }

    async fn focused_window(&self) -> Result<Option<WindowHandle>> {
        Ok(Some(DRY_RUN_CONTROL_WINDOW))
    }
}
