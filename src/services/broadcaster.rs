use crate::config::DispatchConfig;
use crate::debug_if_enabled;
use crate::events::{KeyAction, KeySym, TargetWindow, ToonSlot, TOON_SLOTS};
use crate::services::key_translator::translate;
use crate::services::{HeldKeys, InputInjector, ToonContext, WindowLocator};
use crate::utils::LogSink;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Timing knobs of the dispatch loop. They encode workarounds for the injection
/// backend's timing and may need tuning for another backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub symbol_release_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            debounce: Duration::from_millis(50),
            symbol_release_delay: Duration::from_millis(10),
        }
    }
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            debounce: Duration::from_millis(config.debounce_ms),
            symbol_release_delay: Duration::from_millis(config.symbol_release_delay_ms),
        }
    }
}

/// What one tick did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Focus was outside the targets and the control window; nothing was looked at
    pub gated: bool,
    pub pressed: usize,
    pub released: usize,
    pub typed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LedgerAction {
    Down,
    Up,
    Text,
}

impl From<KeyAction> for LedgerAction {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::Down => LedgerAction::Down,
            KeyAction::Up => LedgerAction::Up,
        }
    }
}

/// Last send time per (toon, key, action). Overwritten in place, so its size is bounded
/// by the key vocabulary times four toons times three actions.
#[derive(Debug, Default)]
struct DebounceLedger {
    last_sent: HashMap<(usize, KeySym, LedgerAction), Instant>,
}

impl DebounceLedger {
    fn sent_within(&self, toon: usize, key: KeySym, action: LedgerAction, now: Instant, window: Duration) -> bool {
        self.last_sent
            .get(&(toon, key, action))
            .is_some_and(|&last| now.saturating_duration_since(last) < window)
    }

    fn record(&mut self, toon: usize, key: KeySym, action: LedgerAction, now: Instant) {
        self.last_sent.insert((toon, key, action), now);
    }
}

/// Keys the loop believes it has forwarded and not yet released.
#[derive(Debug, Default)]
struct ForwardedKeys {
    keys_held: HashSet<KeySym>,
    symbols_sent: HashSet<KeySym>,
}

#[derive(Debug, Default)]
struct DispatchState {
    forwarded: ForwardedKeys,
    ledger: DebounceLedger,
}

/// The dispatch loop: diffs the globally held keys against what has been forwarded and
/// fans key-down, key-up and text injections out to the enabled toons.
pub struct Broadcaster {
    context: Arc<ToonContext>,
    locator: Arc<WindowLocator>,
    injector: Arc<dyn InputInjector>,
    held: Arc<HeldKeys>,
    log: Arc<dyn LogSink>,
    settings: DispatchSettings,
    state: Mutex<DispatchState>,
    running: AtomicBool,
    shutdown: Notify,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Broadcaster {
    pub fn new(
        context: Arc<ToonContext>,
        locator: Arc<WindowLocator>,
        injector: Arc<dyn InputInjector>,
        held: Arc<HeldKeys>,
        log: Arc<dyn LogSink>,
        settings: DispatchSettings,
    ) -> Self {
        info!(
            "Broadcaster ready (poll {:?}, debounce {:?})",
            settings.poll_interval, settings.debounce
        );
        Self {
            context,
            locator,
            injector,
            held,
            log,
            settings,
            state: Mutex::new(DispatchState::default()),
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
            task: parking_lot::Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the polling loop. No-op when already running.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.task.lock() = Some(handle);
        info!("Dispatch loop started");
    }

    /// Halt the loop and key-up everything still held on the targets before returning.
    /// Calling it again is a no-op.
    pub async fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_waiters();
            let task = self.task.lock().take();
            if let Some(task) = task {
                // The loop finishes its current tick first, so nothing is half-forwarded
                if let Err(e) = task.await {
                    error!("Dispatch loop ended abnormally: {}", e);
                }
            }
            info!("Dispatch loop stopped");
        }

        let mut state = self.state.lock().await;
        self.release_all(&mut state).await;
    }

    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown.notified() => break,
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.tick(Instant::now()).await;
        }
    }

    /// One polling step at time `now`.
    pub async fn tick(&self, now: Instant) -> TickReport {
        let mut state = self.state.lock().await;
        let mut report = TickReport::default();

        let focused = self.locator.focused_window().await;
        if !focused.is_some_and(|handle| self.context.owns_window(handle)) {
            report.gated = true;
            return report;
        }

        let mut targets = self.context.targets();
        if targets.is_empty() {
            targets = self.locator.refresh(&self.context).await;
            if !targets.is_empty() {
                self.log.log(&format!("[Service] Found {} toon window(s)", targets.len()));
            }
        }

        let slots = self.context.slots();
        let held = self.held.snapshot();
        let DispatchState { forwarded, ledger } = &mut *state;

        let mut to_type: SmallVec<[KeySym; 4]> = held
            .iter()
            .copied()
            .filter(|key| key.is_text() && !forwarded.symbols_sent.contains(key))
            .collect();
        to_type.sort();
        for symbol in to_type {
            self.type_symbol(symbol, &targets, &slots, ledger, now).await;
            forwarded.symbols_sent.insert(symbol);
            report.typed += 1;
        }

        let mut to_press: SmallVec<[KeySym; 8]> = held
            .iter()
            .copied()
            .filter(|key| !key.is_text() && !forwarded.keys_held.contains(key))
            .collect();
        to_press.sort();
        for key in to_press {
            self.fan_out(key, KeyAction::Down, &targets, &slots, ledger, now).await;
            forwarded.keys_held.insert(key);
            report.pressed += 1;
        }

        let mut released: SmallVec<[KeySym; 8]> = forwarded
            .keys_held
            .union(&forwarded.symbols_sent)
            .copied()
            .filter(|key| !held.contains(key))
            .collect();
        released.sort();
        for key in released {
            if forwarded.keys_held.remove(&key) {
                self.fan_out(key, KeyAction::Up, &targets, &slots, ledger, now).await;
                report.released += 1;
            }
            forwarded.symbols_sent.remove(&key);
        }

        report
    }

    async fn fan_out(
        &self,
        key: KeySym,
        action: KeyAction,
        targets: &[TargetWindow],
        slots: &[ToonSlot; TOON_SLOTS],
        ledger: &mut DebounceLedger,
        now: Instant,
    ) {
        for (toon, slot) in slots.iter().enumerate() {
            if !slot.enabled {
                continue;
            }
            let Some(target) = targets.get(toon) else {
                continue;
            };
            let Some(mapped) = translate(key, slot.scheme) else {
                continue;
            };

            if action == KeyAction::Down
                && ledger.sent_within(toon, mapped, LedgerAction::Down, now, self.settings.debounce)
            {
                debug_if_enabled!("Toon {}: key-down '{}' debounced", toon + 1, mapped);
                continue;
            }
            ledger.record(toon, mapped, action.into(), now);

            debug_if_enabled!("Toon {}: {} '{}' -> {}", toon + 1, action.xdotool_command(), mapped, target.handle);
            if let Err(e) = self.injector.send_key(target.handle, mapped, action).await {
                warn!("Toon {}: {} '{}' dropped: {}", toon + 1, action.xdotool_command(), mapped, e);
            }
        }
    }

    async fn type_symbol(
        &self,
        symbol: KeySym,
        targets: &[TargetWindow],
        slots: &[ToonSlot; TOON_SLOTS],
        ledger: &mut DebounceLedger,
        now: Instant,
    ) {
        for (toon, slot) in slots.iter().enumerate() {
            if !slot.enabled {
                continue;
            }
            let Some(target) = targets.get(toon) else {
                continue;
            };
            let Some(mapped) = translate(symbol, slot.scheme) else {
                continue;
            };
            if ledger.sent_within(toon, mapped, LedgerAction::Text, now, self.settings.debounce) {
                debug_if_enabled!("Toon {}: '{}' typed too recently", toon + 1, mapped);
                continue;
            }

            if let Err(e) = self.injector.send_text(target.handle, mapped.as_str()).await {
                warn!("Toon {}: typing '{}' dropped: {}", toon + 1, mapped, e);
                continue;
            }

            if self.injector.text_leaves_shift_down() {
                tokio::time::sleep(self.settings.symbol_release_delay).await;
                if let Err(e) = self.injector.send_key(target.handle, KeySym::SHIFT_L, KeyAction::Up).await {
                    warn!("Toon {}: releasing shift after '{}' failed: {}", toon + 1, mapped, e);
                }
            }
            ledger.record(toon, mapped, LedgerAction::Text, now);
        }
    }

    async fn release_all(&self, state: &mut DispatchState) {
        let mut keys: SmallVec<[KeySym; 8]> = state.forwarded.keys_held.drain().collect();
        state.forwarded.symbols_sent.clear();
        if keys.is_empty() {
            return;
        }
        keys.sort();

        let targets = self.context.targets();
        let slots = self.context.slots();
        self.log.log(&format!(
            "[Service] Releasing {} held key(s) on {} window(s)",
            keys.len(),
            targets.len()
        ));

        for key in keys {
            for (toon, target) in targets.iter().enumerate() {
                let scheme = slots.get(toon).map(|slot| slot.scheme).unwrap_or_default();
                let Some(mapped) = translate(key, scheme) else {
                    continue;
                };
                if let Err(e) = self.injector.send_key(target.handle, mapped, KeyAction::Up).await {
                    warn!("Toon {}: final key-up '{}' failed: {}", toon + 1, mapped, e);
                }
            }
        }
    }
}
