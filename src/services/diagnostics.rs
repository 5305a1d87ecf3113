//! Symbol test: drives every injection method for each key of the vocabulary against
//! one window and reports which combinations the display server rejects.

use crate::error::Result;
use crate::events::{KeyAction, KeySym, WindowHandle};
use crate::services::InputInjector;
use crate::utils::LogSink;
use std::time::Duration;
use tracing::{debug, info};

/// Pause between keys
pub const KEY_PAUSE: Duration = Duration::from_millis(50);
/// Pause between key-down and key-up
pub const RELEASE_PAUSE: Duration = Duration::from_millis(10);

const fn k(name: &'static str) -> KeySym {
    KeySym::from_static(name)
}

/// Test order: shifted and plain punctuation, named keys, letters, digits.
pub const TEST_KEYS: &[KeySym] = &[
    k("~"), k("!"), k("@"), k("#"), k("$"), k("%"), k("^"), k("&"), k("*"), k("("), k(")"),
    k("_"), k("+"), k("{"), k("}"), k("|"), k(":"), k("\""), k("<"), k(">"), k("?"),
    k("`"), k("-"), k("="), k("["), k("]"), k("\\"), k(";"), k("'"), k(","), k("."), k("/"),
    k("Return"), k("BackSpace"), k("Tab"), k("Escape"), k("Delete"), k("space"),
    k("Shift_L"), k("Control_L"), k("Alt_L"), k("Up"), k("Down"), k("Left"), k("Right"),
    k("a"), k("b"), k("c"), k("d"), k("e"), k("f"), k("g"), k("h"), k("i"), k("j"), k("k"),
    k("l"), k("m"), k("n"), k("o"), k("p"), k("q"), k("r"), k("s"), k("t"), k("u"), k("v"),
    k("w"), k("x"), k("y"), k("z"),
    k("1"), k("2"), k("3"), k("4"), k("5"), k("6"), k("7"), k("8"), k("9"), k("0"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Tap,
    Down,
    Up,
    Type,
}

impl Method {
    pub fn label(&self) -> &'static str {
        match self {
            Method::Tap => "KEY",
            Method::Down => "KEYDOWN",
            Method::Up => "KEYUP",
            Method::Type => "TYPE",
        }
    }
}

/// Outcome of one symbol test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub window: WindowHandle,
    pub passed: usize,
    pub failures: Vec<(Method, KeySym)>,
}

impl DiagnosticsReport {
    pub fn summary(&self) -> String {
        format!(
            "Symbol test on window {}: {} passed, {} failed",
            self.window,
            self.passed,
            self.failures.len()
        )
    }
}

/// Text typed for a key, if it has a printable form.
fn typed_text(key: KeySym) -> Option<&'static str> {
    match key.as_str() {
        "space" => Some(" "),
        name if name.chars().count() == 1 => Some(name),
        _ => None,
    }
}

pub struct SymbolTest<'a> {
    injector: &'a dyn InputInjector,
    log: &'a dyn LogSink,
}

impl<'a> SymbolTest<'a> {
    pub fn new(injector: &'a dyn InputInjector, log: &'a dyn LogSink) -> Self {
        Self { injector, log }
    }

    pub async fn run(&self, window: WindowHandle) -> DiagnosticsReport {
        self.log.log("[Diagnostics] Starting symbol test...");
        info!("Symbol test against window {}", window);

        let mut report = DiagnosticsReport { window, passed: 0, failures: Vec::new() };
        for &key in TEST_KEYS {
            self.try_all_methods(window, key, &mut report).await;
            tokio::time::sleep(KEY_PAUSE).await;
        }

        self.log.log("[Diagnostics] Symbol test complete.");
        self.log.log(&format!("[Diagnostics] {}", report.summary()));
        report
    }

    async fn try_all_methods(&self, window: WindowHandle, key: KeySym, report: &mut DiagnosticsReport) {
        let result = self.injector.send_tap(window, key).await;
        self.record(Method::Tap, key, result, report);

        let result = self.injector.send_key(window, key, KeyAction::Down).await;
        self.record(Method::Down, key, result, report);

        tokio::time::sleep(RELEASE_PAUSE).await;
        let result = self.injector.send_key(window, key, KeyAction::Up).await;
        self.record(Method::Up, key, result, report);

        match typed_text(key) {
            Some(text) => {
                let result = self.injector.send_text(window, text).await;
                self.record(Method::Type, key, result, report);
            }
            None => debug!("No printable form for '{}', type skipped", key),
        }
    }

    fn record(&self, method: Method, key: KeySym, result: Result<()>, report: &mut DiagnosticsReport) {
        match result {
            Ok(()) => {
                report.passed += 1;
                self.log.log(&format!("[Diagnostics] {} OK: {}", method.label(), key));
            }
            Err(e) => {
                report.failures.push((method, key));
                self.log.log(&format!("[Diagnostics] {} FAIL: {}\n    stderr: {}", method.label(), key, e));
            }
        }
    }
}
