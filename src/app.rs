use crate::config::Config;
use crate::error::Result;
use crate::events::{ControlScheme, KeyEvent, KeySym, TargetWindow, ToonSlot, WindowHandle, TOON_SLOTS};
use crate::multitoon_error;
use crate::services::{
    Broadcaster, DiagnosticsReport, DispatchSettings, HeldKeys, InputInjector, KeepAlivePulser, SymbolTest,
    ToonContext, WindowLocator, WindowQuery,
};
use crate::storage::settings::{CONTROL_WINDOW_ID, KEEP_ALIVE_DELAY, KEEP_ALIVE_KEY, LEFT_TO_RIGHT};
use crate::storage::{format_delay_label, parse_delay_label, Preset, PresetStore, SettingsStore};
use crate::utils::LogSink;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedReceiver, Mutex};
use tracing::{info, warn};

/// Point-in-time view of the controller for the console
#[derive(Debug, Clone)]
pub struct Status {
    pub service_running: bool,
    pub keep_alive_running: bool,
    pub keep_alive_key: Option<KeySym>,
    pub keep_alive_interval: Duration,
    pub left_to_right: bool,
    pub targets: Vec<TargetWindow>,
    pub slots: [ToonSlot; TOON_SLOTS],
}

impl Status {
    pub fn enabled_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.enabled).count()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.service_running, self.enabled_count()) {
            (true, 0) => writeln!(f, "Service running (no toons enabled)")?,
            (true, n) => writeln!(f, "Service running ({} toon(s) enabled)", n)?,
            (false, _) => writeln!(f, "Service idle")?,
        }
        for (index, slot) in self.slots.iter().enumerate() {
            let window = self
                .targets
                .get(index)
                .map(ToString::to_string)
                .unwrap_or_else(|| "no window".to_string());
            writeln!(
                f,
                "  Toon {}: {:<8} {:<6} {}",
                index + 1,
                if slot.enabled { "enabled" } else { "disabled" },
                slot.scheme,
                window
            )?;
        }
        let key = self.keep_alive_key.map(|k| k.to_string()).unwrap_or_else(|| "none".to_string());
        writeln!(
            f,
            "Keep-alive: {} (key {}, every {})",
            if self.keep_alive_running { "running" } else { "stopped" },
            key,
            format_delay_label(self.keep_alive_interval)
        )?;
        write!(f, "Left-to-right assignment: {}", if self.left_to_right { "on" } else { "off" })
    }
}

/// The service controller: owns the toon slots on behalf of the operator and drives the
/// dispatch loop, the keep-alive pulser and the persisted settings and presets.
pub struct Multitoon {
    context: Arc<ToonContext>,
    locator: Arc<WindowLocator>,
    broadcaster: Arc<Broadcaster>,
    keep_alive: Arc<KeepAlivePulser>,
    injector: Arc<dyn InputInjector>,
    settings: SettingsStore,
    presets: PresetStore,
    log: Arc<dyn LogSink>,
    // serialises operations that start/stop the loop or rewrite the target list
    ops: Mutex<()>,
}

impl Multitoon {
    pub fn new(
        config: &Config,
        storage_dir: &Path,
        query: Arc<dyn WindowQuery>,
        injector: Arc<dyn InputInjector>,
        held: Arc<HeldKeys>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let settings = SettingsStore::open(storage_dir);
        let presets = PresetStore::open(storage_dir);

        let left_to_right = settings.get(LEFT_TO_RIGHT, config.window.left_to_right);
        let context = Arc::new(ToonContext::new());
        let locator = Arc::new(WindowLocator::new(query, config.window.class_name.clone(), left_to_right));

        let broadcaster = Arc::new(Broadcaster::new(
            context.clone(),
            locator.clone(),
            injector.clone(),
            held,
            log.clone(),
            DispatchSettings::from(&config.dispatch),
        ));

        let default_delay = format_delay_label(Duration::from_secs(config.keep_alive.interval_secs));
        let interval = parse_delay_label(&settings.get(KEEP_ALIVE_DELAY, default_delay));
        let keep_alive = Arc::new(KeepAlivePulser::new(
            context.clone(),
            injector.clone(),
            log.clone(),
            interval,
            Duration::from_millis(config.keep_alive.press_ms),
        ));

        let stored_key: String = settings.get(KEEP_ALIVE_KEY, String::new());
        let key_text = if stored_key.trim().is_empty() {
            config.keep_alive.key.clone().unwrap_or_default()
        } else {
            stored_key
        };
        if !key_text.trim().is_empty() {
            match KeySym::parse(&key_text) {
                Some(key) => keep_alive.set_key(Some(key)),
                None => warn!("Stored keep-alive key '{}' is not a known key, ignoring", key_text),
            }
        }

        info!(
            "Controller ready (storage {}, left-to-right {})",
            storage_dir.display(),
            left_to_right
        );

        Self {
            context,
            locator,
            broadcaster,
            keep_alive,
            injector,
            settings,
            presets,
            log,
            ops: Mutex::new(()),
        }
    }

    /// Record the control surface used by the focus gate.
    pub fn set_control_window(&self, handle: WindowHandle) {
        self.context.set_control_window(Some(handle));
        if let Err(e) = self.settings.set(CONTROL_WINDOW_ID, handle) {
            warn!("Failed to persist control window id: {}", e);
        }
        info!("Control window is {}", handle);
    }

    pub async fn start_service(&self) {
        let _guard = self.ops.lock().await;
        self.start_service_locked().await;
    }

    pub async fn stop_service(&self) {
        let _guard = self.ops.lock().await;
        self.stop_service_locked().await;
    }

    async fn start_service_locked(&self) {
        if self.broadcaster.is_running() {
            return;
        }
        let targets = self.locator.refresh(&self.context).await;
        for index in 0..targets.len() {
            self.context.set_enabled(index, true);
        }
        self.broadcaster.start();
        self.log.log(&format!(
            "[Service] Multitoon service started ({} toon window(s))",
            targets.len()
        ));
    }

    async fn stop_service_locked(&self) {
        if !self.broadcaster.is_running() {
            return;
        }
        self.broadcaster.stop().await;
        self.context.disable_all();
        self.log.log("[Service] Multitoon service stopped.");
    }

    /// `index` is zero-based. Returns false when there is no such toon.
    pub fn set_toon_enabled(&self, index: usize, enabled: bool) -> bool {
        if !self.context.set_enabled(index, enabled) {
            self.log.log(&format!("[Toon] No toon {} to {}", index + 1, if enabled { "enable" } else { "disable" }));
            return false;
        }
        self.log.log(&format!("[Toon] Toon {} {}", index + 1, if enabled { "enabled" } else { "disabled" }));
        true
    }

    pub fn toggle_toon(&self, index: usize) -> bool {
        match self.context.slots().get(index) {
            Some(slot) => self.set_toon_enabled(index, !slot.enabled),
            None => {
                self.log.log(&format!("[Toon] No toon {} to toggle", index + 1));
                false
            }
        }
    }

    pub fn set_scheme(&self, index: usize, scheme: ControlScheme) -> bool {
        if !self.context.set_scheme(index, scheme) {
            self.log.log(&format!("[Toon] No toon {} for movement mode {}", index + 1, scheme));
            return false;
        }
        self.log.log(&format!("[Toon] Toon {} uses {}", index + 1, scheme));
        true
    }

    /// Rediscover the game windows. Slot enables reset because the slot-to-window
    /// assignment may have changed.
    pub async fn refresh_windows(&self) -> usize {
        let _guard = self.ops.lock().await;
        self.refresh_windows_locked().await
    }

    async fn refresh_windows_locked(&self) -> usize {
        let targets = self.locator.refresh(&self.context).await;
        self.context.disable_all();
        self.log.log(&format!("[Windows] {} toon window(s) assigned", targets.len()));
        targets.len()
    }

    pub fn save_preset(&self, index: u8) -> Result<()> {
        let slots = self.context.slots();
        let preset = Preset {
            enabled_toons: slots.map(|slot| slot.enabled),
            movement_modes: slots.map(|slot| slot.scheme),
            service_running: self.broadcaster.is_running(),
        };
        self.presets.save(index, &preset)?;
        self.log.log(&format!("[Preset] Preset {} saved.", index));
        Ok(())
    }

    /// Returns false when nothing is saved under `index`.
    pub async fn load_preset(&self, index: u8) -> Result<bool> {
        let Some(preset) = self.presets.load(index)? else {
            self.log.log(&format!("[Preset] No saved preset {}", index));
            return Ok(false);
        };

        let _guard = self.ops.lock().await;
        if preset.service_running {
            self.start_service_locked().await;
        } else {
            self.stop_service_locked().await;
        }
        self.refresh_windows_locked().await;

        for (slot, scheme) in preset.movement_modes.iter().enumerate() {
            self.context.set_scheme(slot, *scheme);
        }
        for (slot, enabled) in preset.enabled_toons.iter().enumerate() {
            self.context.set_enabled(slot, *enabled);
        }
        self.log.log(&format!("[Preset] Preset {} loaded.", index));
        Ok(true)
    }

    pub fn start_keep_alive(&self) -> Result<()> {
        self.keep_alive.start()
    }

    pub async fn stop_keep_alive(&self) {
        self.keep_alive.stop().await;
    }

    pub fn set_keep_alive_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        let parsed = if key.is_empty() {
            None
        } else {
            Some(KeySym::parse(key).ok_or_else(|| multitoon_error!(invalid_key, "{}", key))?)
        };
        self.keep_alive.set_key(parsed);
        self.settings.set(KEEP_ALIVE_KEY, parsed.map(|k| k.as_str()).unwrap_or(""))?;
        match parsed {
            Some(k) => self.log.log(&format!("[Keep-Alive] Key set to '{}'", k)),
            None => self.log.log("[Keep-Alive] Key cleared"),
        }
        Ok(())
    }

    pub fn set_keep_alive_interval(&self, interval: Duration) -> Result<()> {
        self.keep_alive.set_interval(interval)?;
        let label = format_delay_label(interval);
        self.settings.set(KEEP_ALIVE_DELAY, &label)?;
        self.log.log(&format!("[Keep-Alive] Interval set to {}", label));
        Ok(())
    }

    /// Run the symbol test against the first game window, discovering windows
    /// when none are tracked yet.
    pub async fn run_diagnostics(&self) -> Result<DiagnosticsReport> {
        let window = match self.context.targets().first() {
            Some(target) => Some(target.handle),
            None => self.locator.discover().await.first().map(|target| target.handle),
        };
        let Some(window) = window else {
            self.log.log("[Diagnostics] No game window found.");
            return Err(multitoon_error!(discovery, "no game window to test against"));
        };
        Ok(SymbolTest::new(self.injector.as_ref(), self.log.as_ref()).run(window).await)
    }

    /// Applies from the next discovery.
    pub fn set_left_to_right(&self, enabled: bool) -> Result<()> {
        self.locator.set_left_to_right(enabled);
        self.settings.set(LEFT_TO_RIGHT, enabled)?;
        self.log.log(&format!(
            "[Settings] Left-to-right assignment {}",
            if enabled { "enabled" } else { "disabled" }
        ));
        Ok(())
    }

    pub fn status(&self) -> Status {
        Status {
            service_running: self.broadcaster.is_running(),
            keep_alive_running: self.keep_alive.is_running(),
            keep_alive_key: self.keep_alive.key(),
            keep_alive_interval: self.keep_alive.interval(),
            left_to_right: self.locator.left_to_right(),
            targets: self.context.targets().to_vec(),
            slots: self.context.slots(),
        }
    }

    /// Load presets on Ctrl+1..5, whatever window has focus.
    pub async fn watch_hotkeys(self: Arc<Self>, mut events: UnboundedReceiver<KeyEvent>) {
        while let Some(event) = events.recv().await {
            let Some(index) = event.preset_hotkey() else {
                continue;
            };
            info!("Preset hotkey Ctrl+{}", index);
            if let Err(e) = self.load_preset(index).await {
                self.log.log(&format!("[Preset] Failed to load preset {}: {}", index, e));
            }
        }
    }

    pub async fn shutdown(&self) {
        self.stop_service().await;
        self.stop_keep_alive().await;
        if let Some(key) = self.keep_alive.key() {
            if let Err(e) = self.settings.set(KEEP_ALIVE_KEY, key.as_str()) {
                warn!("Failed to persist keep-alive key: {}", e);
            }
        }
        info!("Controller shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MultitoonError;
    use crate::events::{KeyState, Modifiers};
    use crate::services::testing::{FakeWindowQuery, Injected, MemorySink, RecordingInjector};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    struct Fixture {
        _dir: TempDir,
        query: Arc<FakeWindowQuery>,
        injector: Arc<RecordingInjector>,
        held: Arc<HeldKeys>,
        sink: Arc<MemorySink>,
        app: Arc<Multitoon>,
    }

    fn fixture_in(dir: TempDir) -> Fixture {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 900), (11, 0)]));
        query.focus(Some(10));
        let injector = Arc::new(RecordingInjector::default());
        let held = Arc::new(HeldKeys::new());
        let sink = Arc::new(MemorySink::default());
        let app = Arc::new(Multitoon::new(
            &Config::default(),
            dir.path(),
            query.clone(),
            injector.clone(),
            held.clone(),
            sink.clone(),
        ));
        Fixture { _dir: dir, query, injector, held, sink, app }
    }

    fn fixture() -> Fixture {
        fixture_in(tempfile::tempdir().unwrap())
    }

    #[tokio::test]
    async fn start_enables_toons_with_windows() {
        let f = fixture();
        f.app.start_service().await;
        f.app.start_service().await;

        let status = f.app.status();
        assert!(status.service_running);
        assert_eq!(status.targets.len(), 2);
        assert_eq!(
            status.slots.map(|slot| slot.enabled),
            [true, true, false, false]
        );
        assert_eq!(f.sink.lines().iter().filter(|l| l.contains("service started")).count(), 1);

        f.app.stop_service().await;
    }

    #[tokio::test]
    async fn stop_releases_keys_and_disables_toons() {
        let f = fixture();
        f.app.start_service().await;
        f.held.press(17, KeySym::W);
        tokio::time::sleep(Duration::from_millis(80)).await;

        f.app.stop_service().await;
        f.app.stop_service().await;

        let calls = f.injector.calls();
        assert!(calls.contains(&Injected::down(10, "w")));
        assert!(calls.contains(&Injected::up(10, "w")));
        assert!(calls.contains(&Injected::up(11, "w")));
        assert_eq!(f.app.status().enabled_count(), 0);
        assert!(!f.app.status().service_running);
    }

    #[tokio::test]
    async fn refresh_resets_enables() {
        let f = fixture();
        f.app.refresh_windows().await;
        f.app.set_toon_enabled(0, true);
        f.query.remove(11);

        assert_eq!(f.app.refresh_windows().await, 1);
        assert_eq!(f.app.status().enabled_count(), 0);
    }

    #[tokio::test]
    async fn out_of_range_toon_is_logged_and_ignored() {
        let f = fixture();
        assert!(!f.app.set_toon_enabled(4, true));
        assert!(!f.app.toggle_toon(9));
        assert!(!f.app.set_scheme(4, ControlScheme::Arrows));
        assert!(f.sink.contains("No toon 5"));
        assert_eq!(f.app.status().enabled_count(), 0);
    }

    #[tokio::test]
    async fn preset_round_trip_restores_layout_and_service_state() {
        let f = fixture();
        f.app.start_service().await;
        f.app.set_toon_enabled(1, false);
        f.app.set_scheme(1, ControlScheme::Arrows);
        f.app.save_preset(3).unwrap();

        f.app.stop_service().await;
        f.app.set_scheme(1, ControlScheme::Wasd);
        assert!(f.app.load_preset(3).await.unwrap());

        let status = f.app.status();
        assert!(status.service_running);
        assert_eq!(status.slots[0], ToonSlot { enabled: true, scheme: ControlScheme::Wasd });
        assert_eq!(status.slots[1], ToonSlot { enabled: false, scheme: ControlScheme::Arrows });
        assert!(f.sink.contains("Preset 3 loaded."));

        f.app.shutdown().await;
    }

    #[tokio::test]
    async fn preset_can_stop_a_running_service() {
        let f = fixture();
        f.app.set_toon_enabled(0, true);
        f.app.save_preset(1).unwrap();

        f.app.start_service().await;
        assert!(f.app.load_preset(1).await.unwrap());
        assert!(!f.app.status().service_running);
        assert!(f.app.status().slots[0].enabled);
    }

    #[tokio::test]
    async fn missing_and_invalid_presets() {
        let f = fixture();
        assert!(!f.app.load_preset(5).await.unwrap());
        assert!(f.sink.contains("No saved preset 5"));
        assert!(matches!(f.app.load_preset(6).await, Err(MultitoonError::InvalidPreset(6))));
        assert!(matches!(f.app.save_preset(0), Err(MultitoonError::InvalidPreset(0))));
    }

    #[tokio::test]
    async fn keep_alive_settings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let f = fixture_in(dir);

        assert!(matches!(f.app.set_keep_alive_key("hyper"), Err(MultitoonError::InvalidKey(_))));
        f.app.set_keep_alive_key("Space").unwrap();
        f.app.set_keep_alive_interval(Duration::from_secs(300)).unwrap();
        assert!(f.app.set_keep_alive_interval(Duration::from_secs(1)).is_err());

        let reopened = Multitoon::new(
            &Config::default(),
            &path,
            f.query.clone(),
            f.injector.clone(),
            Arc::new(HeldKeys::new()),
            Arc::new(MemorySink::default()),
        );
        let status = reopened.status();
        assert_eq!(status.keep_alive_key, Some(KeySym::parse("space").unwrap()));
        assert_eq!(status.keep_alive_interval, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn keep_alive_needs_a_key_before_starting() {
        let f = fixture();
        assert!(matches!(f.app.start_keep_alive(), Err(MultitoonError::NoKeepAliveKey)));
        assert!(!f.app.status().keep_alive_running);

        f.app.set_keep_alive_key("space").unwrap();
        f.app.start_keep_alive().unwrap();
        assert!(f.app.status().keep_alive_running);
        assert!(f.sink.contains("[Keep-Alive] Started: 'space'"));
        f.app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn diagnostics_target_the_first_game_window() {
        let f = fixture();
        f.injector.fail_window(10);

        let report = f.app.run_diagnostics().await.unwrap();

        assert_eq!(report.window, WindowHandle(10));
        assert_eq!(report.passed, 0);
        assert!(!report.failures.is_empty());
        assert!(f.injector.calls().iter().all(|call| match call {
            Injected::Key(window, _, _) | Injected::Text(window, _) => *window == WindowHandle(10),
        }));
        assert!(f.sink.contains("[Diagnostics] KEY FAIL: w"));
        assert!(f.sink.contains("[Diagnostics] Symbol test complete."));
    }

    #[tokio::test]
    async fn diagnostics_without_windows_fail() {
        let f = fixture();
        f.query.remove(10);
        f.query.remove(11);

        assert!(matches!(f.app.run_diagnostics().await, Err(MultitoonError::Discovery(_))));
        assert!(f.sink.contains("[Diagnostics] No game window found."));
        assert!(f.injector.calls().is_empty());
    }

    #[tokio::test]
    async fn left_to_right_orders_targets_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let f = fixture_in(dir);

        f.app.refresh_windows().await;
        assert_eq!(f.app.status().targets[0].handle, WindowHandle(10));

        f.app.set_left_to_right(true).unwrap();
        f.app.refresh_windows().await;
        assert_eq!(f.app.status().targets[0].handle, WindowHandle(11));

        let settings = SettingsStore::open(&path);
        assert!(settings.get(LEFT_TO_RIGHT, false));
    }

    #[tokio::test]
    async fn control_window_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let f = fixture_in(dir);

        f.app.set_control_window(WindowHandle(77));
        assert_eq!(f.app.context.control_window(), Some(WindowHandle(77)));
        assert_eq!(SettingsStore::open(&path).get(CONTROL_WINDOW_ID, 0u64), 77);
    }

    #[tokio::test]
    async fn ctrl_digit_loads_preset() {
        let f = fixture();
        f.app.set_scheme(2, ControlScheme::Arrows);
        f.app.save_preset(2).unwrap();
        f.app.set_scheme(2, ControlScheme::Wasd);

        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = tokio::spawn(f.app.clone().watch_hotkeys(rx));

        let ctrl = Modifiers { ctrl: true, ..Modifiers::default() };
        let two = KeySym::parse("2").unwrap();
        tx.send(KeyEvent::new(3, two, KeyState::Pressed, Modifiers::default())).unwrap();
        tx.send(KeyEvent::new(3, two, KeyState::Pressed, ctrl)).unwrap();
        drop(tx);
        watcher.await.unwrap();

        assert_eq!(f.app.status().slots[2].scheme, ControlScheme::Arrows);
        assert_eq!(f.sink.lines().iter().filter(|l| l.contains("Preset 2 loaded.")).count(), 1);
    }

    #[tokio::test]
    async fn status_summarises_state() {
        let f = fixture();
        assert!(f.app.status().to_string().starts_with("Service idle"));

        f.app.start_service().await;
        let text = f.app.status().to_string();
        assert!(text.starts_with("Service running (2 toon(s) enabled)"));
        assert!(text.contains("Toon 3: disabled"));
        f.app.stop_service().await;
    }
}
