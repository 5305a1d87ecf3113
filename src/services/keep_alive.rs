use crate::error::{MultitoonError, Result};
use crate::events::{KeyAction, KeySym};
use crate::services::{InputInjector, ToonContext};
use crate::utils::LogSink;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const MIN_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_INTERVAL: Duration = Duration::from_secs(600);

/// Periodically taps one key on every tracked target so idle clients are not
/// disconnected. Runs beside the dispatch loop and ignores focus.
pub struct KeepAlivePulser {
    context: Arc<ToonContext>,
    injector: Arc<dyn InputInjector>,
    log: Arc<dyn LogSink>,
    key: RwLock<Option<KeySym>>,
    interval: RwLock<Duration>,
    press: Duration,
    running: AtomicBool,
    shutdown: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl KeepAlivePulser {
    pub fn new(
        context: Arc<ToonContext>,
        injector: Arc<dyn InputInjector>,
        log: Arc<dyn LogSink>,
        interval: Duration,
        press: Duration,
    ) -> Self {
        Self {
            context,
            injector,
            log,
            key: RwLock::new(None),
            interval: RwLock::new(interval.clamp(MIN_INTERVAL, MAX_INTERVAL)),
            press,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
            task: Mutex::new(None),
        }
    }

    pub fn key(&self) -> Option<KeySym> {
        *self.key.read()
    }

    /// Clearing the key while running keeps the loop ticking without sending anything.
    pub fn set_key(&self, key: Option<KeySym>) {
        *self.key.write() = key;
    }

    pub fn interval(&self) -> Duration {
        *self.interval.read()
    }

    /// Takes effect from the next pulse.
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        if !(MIN_INTERVAL..=MAX_INTERVAL).contains(&interval) {
            return Err(MultitoonError::Config(anyhow::anyhow!(
                "keep-alive interval must be between {}s and {}s, got {}s",
                MIN_INTERVAL.as_secs(),
                MAX_INTERVAL.as_secs(),
                interval.as_secs()
            )));
        }
        *self.interval.write() = interval;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Refuses to start until a key is configured.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let Some(key) = self.key() else {
            self.log.log("[Keep-Alive] Set a key before enabling");
            return Err(MultitoonError::NoKeepAliveKey);
        };
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.task.lock() = Some(handle);

        self.log.log(&format!(
            "[Keep-Alive] Started: '{}' every {}s",
            key,
            self.interval().as_secs()
        ));
        Ok(())
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_waiters();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Keep-alive loop ended abnormally: {}", e);
            }
        }
        self.log.log("[Keep-Alive] Stopped");
    }

    async fn run_loop(&self) {
        while self.running.load(Ordering::SeqCst) {
            let wait = self.interval();
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.shutdown.notified() => break,
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.pulse().await;
        }
    }

    /// Tap the configured key on every current target. Returns how many targets
    /// received the full down/up pair.
    pub async fn pulse(&self) -> usize {
        let Some(key) = self.key() else {
            debug!("Keep-alive pulse skipped: no key configured");
            return 0;
        };
        let targets = self.context.targets();
        if targets.is_empty() {
            debug!("Keep-alive pulse skipped: no targets");
            return 0;
        }

        let mut delivered = 0;
        for target in targets.iter() {
            if let Err(e) = self.injector.send_key(target.handle, key, KeyAction::Down).await {
                warn!("Keep-alive key-down on {} failed: {}", target.handle, e);
                continue;
            }
            tokio::time::sleep(self.press).await;
            match self.injector.send_key(target.handle, key, KeyAction::Up).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Keep-alive key-up on {} failed: {}", target.handle, e),
            }
        }
        if delivered > 0 {
            self.log.log(&format!("[Keep-Alive] Sent key: {}", key));
        }
        debug!("Keep-alive '{}' reached {}/{} target(s)", key, delivered, targets.len());
        delivered
    }
}
