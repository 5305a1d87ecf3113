use crate::events::{ControlScheme, TargetWindow, ToonSlot, WindowHandle, TOON_SLOTS};
use parking_lot::RwLock;
use std::sync::Arc;

/// ToonContext is the state shared between the controller, the dispatch loop and the
/// keep-alive pulser.
///
/// Responsibilities (strict):
/// - Hold the four toon slots. Only the controller writes them; readers take a copy per tick.
/// - Hold the current target list. Only the window locator replaces it, and it is replaced
///   whole so no reader ever observes a partially-updated list.
/// - Hold the handle of the multiplexer's own control window for the focus gate.
/// - Do NOT make any forwarding decisions; those belong to the Broadcaster.
pub struct ToonContext {
    slots: RwLock<[ToonSlot; TOON_SLOTS]>,
    targets: RwLock<Arc<[TargetWindow]>>,
    control_window: RwLock<Option<WindowHandle>>,
}

impl Default for ToonContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ToonContext {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new([ToonSlot::default(); TOON_SLOTS]),
            targets: RwLock::new(Arc::from(Vec::new())),
            control_window: RwLock::new(None),
        }
    }

    pub fn slots(&self) -> [ToonSlot; TOON_SLOTS] {
        *self.slots.read()
    }

    /// Returns false when `index` has no slot.
    pub fn set_enabled(&self, index: usize, enabled: bool) -> bool {
        match self.slots.write().get_mut(index) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns false when `index` has no slot.
    pub fn set_scheme(&self, index: usize, scheme: ControlScheme) -> bool {
        match self.slots.write().get_mut(index) {
            Some(slot) => {
                slot.scheme = scheme;
                true
            }
            None => false,
        }
    }

    pub fn disable_all(&self) {
        for slot in self.slots.write().iter_mut() {
            slot.enabled = false;
        }
    }

    pub fn targets(&self) -> Arc<[TargetWindow]> {
        self.targets.read().clone()
    }

    pub fn replace_targets(&self, targets: Vec<TargetWindow>) -> Arc<[TargetWindow]> {
        let targets: Arc<[TargetWindow]> = Arc::from(targets);
        *self.targets.write() = targets.clone();
        targets
    }

    pub fn control_window(&self) -> Option<WindowHandle> {
        *self.control_window.read()
    }

    pub fn set_control_window(&self, handle: Option<WindowHandle>) {
        *self.control_window.write() = handle;
    }

    /// True when `handle` is one of the targets or the control window.
    pub fn owns_window(&self, handle: WindowHandle) -> bool {
        self.control_window() == Some(handle)
            || self.targets.read().iter().any(|t| t.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowGeometry;

    fn target(id: u64, x: i32) -> TargetWindow {
        TargetWindow::new(WindowHandle(id), WindowGeometry { x, y: 0, width: 800, height: 600 })
    }

    #[test]
    fn slot_setters_ignore_out_of_range() {
        let ctx = ToonContext::new();
        assert!(ctx.set_enabled(3, true));
        assert!(ctx.set_scheme(1, ControlScheme::Arrows));
        assert!(!ctx.set_enabled(4, true));
        assert!(!ctx.set_scheme(7, ControlScheme::Arrows));

        let slots = ctx.slots();
        assert!(slots[3].enabled);
        assert_eq!(slots[1].scheme, ControlScheme::Arrows);

        ctx.disable_all();
        assert!(ctx.slots().iter().all(|s| !s.enabled));
        assert_eq!(ctx.slots()[1].scheme, ControlScheme::Arrows);
    }

    #[test]
    fn targets_are_replaced_whole() {
        let ctx = ToonContext::new();
        let before = ctx.targets();
        ctx.replace_targets(vec![target(1, 0), target(2, 100)]);

        assert!(before.is_empty());
        assert_eq!(ctx.targets().len(), 2);
        assert!(ctx.owns_window(WindowHandle(2)));
        assert!(!ctx.owns_window(WindowHandle(3)));

        ctx.set_control_window(Some(WindowHandle(3)));
        assert!(ctx.owns_window(WindowHandle(3)));
    }
}
