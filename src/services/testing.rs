//! In-memory stand-ins for the display server, the injection backend and the log sink.

use crate::error::{MultitoonError, Result};
use crate::events::{KeyAction, KeySym, WindowGeometry, WindowHandle};
use crate::services::{InputInjector, WindowQuery};
use crate::utils::LogSink;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct FakeWindowQuery {
    windows: Mutex<Vec<(WindowHandle, Option<WindowGeometry>)>>,
    focused: Mutex<Option<WindowHandle>>,
    fail_listing: AtomicBool,
}

impl FakeWindowQuery {
    pub fn with_windows(windows: &[(u64, i32)]) -> Self {
        let fake = Self::default();
        for &(id, x) in windows {
            fake.windows.lock().push((
                WindowHandle(id),
                Some(WindowGeometry { x, y: 0, width: 800, height: 600 }),
            ));
        }
        fake
    }

    /// Listed by the server but reports no geometry
    pub fn push_hidden(&self, id: u64) {
        self.windows.lock().push((WindowHandle(id), None));
    }

    pub fn push_duplicate(&self, id: u64) {
        let mut windows = self.windows.lock();
        if let Some(entry) = windows.iter().find(|(h, _)| h.value() == id).copied() {
            windows.push(entry);
        }
    }

    pub fn remove(&self, id: u64) {
        self.windows.lock().retain(|(h, _)| h.value() != id);
    }

    pub fn focus(&self, handle: Option<u64>) {
        *self.focused.lock() = handle.map(WindowHandle);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl WindowQuery for FakeWindowQuery {
    async fn list_windows(&self, _class_name: &str) -> Result<Vec<WindowHandle>> {
        if self.fail_listing.load(Ordering::Relaxed) {
            return Err(MultitoonError::ServiceUnavailable("xdotool not available".into()));
        }
        Ok(self.windows.lock().iter().map(|(h, _)| *h).collect())
    }

    async fn find_by_name(&self, _name: &str) -> Result<Vec<WindowHandle>> {
        Ok(Vec::new())
    }

    async fn geometry(&self, handle: WindowHandle) -> Result<Option<WindowGeometry>> {
        Ok(self
            .windows
            .lock()
            .iter()
            .find(|(h, _)| *h == handle)
            .and_then(|(_, g)| *g))
    }

    async fn focused_window(&self) -> Result<Option<WindowHandle>> {
        Ok(*self.focused.lock())
    }
}

/// One call made against the injector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Key(WindowHandle, String, KeyAction),
    Text(WindowHandle, String),
}

impl Injected {
    pub fn down(window: u64, key: &str) -> Self {
        Injected::Key(WindowHandle(window), key.to_string(), KeyAction::Down)
    }

    pub fn up(window: u64, key: &str) -> Self {
        Injected::Key(WindowHandle(window), key.to_string(), KeyAction::Up)
    }

    pub fn text(window: u64, text: &str) -> Self {
        Injected::Text(WindowHandle(window), text.to_string())
    }
}

#[derive(Default)]
pub struct RecordingInjector {
    calls: Mutex<Vec<Injected>>,
    failing: Mutex<HashSet<WindowHandle>>,
    leaves_shift_down: bool,
}

impl RecordingInjector {
    /// Recorder that behaves like xdotool with respect to the shift artifact
    pub fn xdotool_like() -> Self {
        Self {
            leaves_shift_down: true,
            ..Self::default()
        }
    }

    /// Calls to `window` are recorded but fail
    pub fn fail_window(&self, window: u64) {
        self.failing.lock().insert(WindowHandle(window));
    }

    pub fn take(&self) -> Vec<Injected> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn calls(&self) -> Vec<Injected> {
        self.calls.lock().clone()
    }

    fn outcome(&self, window: WindowHandle) -> Result<()> {
        if self.failing.lock().contains(&window) {
            Err(MultitoonError::injection(window, "window closed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl InputInjector for RecordingInjector {
    async fn send_key(&self, window: WindowHandle, key: KeySym, action: KeyAction) -> Result<()> {
        self.calls.lock().push(Injected::Key(window, key.as_str().to_string(), action));
        self.outcome(window)
    }

    async fn send_text(&self, window: WindowHandle, text: &str) -> Result<()> {
        self.calls.lock().push(Injected::Text(window, text.to_string()));
        self.outcome(window)
    }

    fn text_leaves_shift_down(&self) -> bool {
        self.leaves_shift_down
    }
}

#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}
