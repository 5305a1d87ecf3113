pub mod broadcaster;
pub mod diagnostics;
pub mod held_keys;
pub mod injector;
pub mod keep_alive;
pub mod key_translator;
pub mod keyboard_listener;
pub mod toon_context;
pub mod window_locator;
pub mod xdotool;

#[cfg(test)]
pub mod testing;

pub use broadcaster::{Broadcaster, DispatchSettings};
pub use diagnostics::{DiagnosticsReport, SymbolTest};
pub use held_keys::HeldKeys;
pub use injector::{create_injector, InputInjector};
pub use keep_alive::KeepAlivePulser;
pub use keyboard_listener::{create_keyboard_listener, KeyTracker};
pub use toon_context::ToonContext;
pub use window_locator::{create_window_query, WindowLocator, WindowQuery};
